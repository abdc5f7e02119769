//! E-pass page layout

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::visitor::VisitorRecord;

use super::assets::DecodedImage;
use super::builder::{fit, Color, DocumentBuilder, Font, TextStyle, PAGE_HEIGHT, PAGE_WIDTH};

const BORDER_INSET: f32 = 10.0;
const LOGO_BOX: f32 = 100.0;
const MAP_BOX_WIDTH: f32 = 500.0;
const MAP_BOX_HEIGHT: f32 = 400.0;
/// Half a centimetre
const MAP_LIFT: f32 = 14.17;

/// Fixed texts of the pass
#[derive(Debug, Clone)]
pub struct PassLayout {
    pub institution_name: String,
    pub map_heading: String,
    pub timezone: Tz,
}

/// Images available for this render
#[derive(Debug, Default)]
pub struct PassAssets {
    pub logo: Option<DecodedImage>,
    pub map: Option<DecodedImage>,
}

/// Creation time as printed on the pass, e.g. `5/1/2024, 3:30:00 PM`
pub fn format_created_at(created_at: DateTime<Utc>, timezone: Tz) -> String {
    created_at
        .with_timezone(&timezone)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

/// Draw the whole pass, top to bottom
pub fn draw_pass(
    builder: &mut DocumentBuilder,
    record: &VisitorRecord,
    layout: &PassLayout,
    assets: &PassAssets,
) {
    builder.stroke_rect(
        BORDER_INSET,
        BORDER_INSET,
        PAGE_WIDTH - 2.0 * BORDER_INSET,
        PAGE_HEIGHT - 2.0 * BORDER_INSET,
        Color::BLACK,
    );

    if let Some(logo) = &assets.logo {
        let handle = builder.embed_image(logo);
        let (width, height) = fit(handle.width, handle.height, LOGO_BOX, LOGO_BOX);
        let x = PAGE_WIDTH - LOGO_BOX - BORDER_INSET + (LOGO_BOX - width);
        builder.draw_image(&handle, x, BORDER_INSET, width, height);
    }

    let heading = TextStyle::new(Font::TimesBold, 28.0).color(Color::BLUE).centered();
    builder.text(&layout.institution_name, heading);
    builder.move_down();
    builder.text("Visitor E-Pass", TextStyle { size: 22.0, ..heading }.underlined());
    builder.move_down();

    let field = TextStyle::new(Font::Helvetica, 18.0);
    let lines = [
        format!("Visitor Name: {}", record.visitor_name),
        format!("Number of Persons: {}", record.no_of_persons),
        format!("Purpose: {}", record.purpose),
        format!("Contact Number: {}", record.contact_number),
        format!("Visit Date: {}", record.visit_date),
        format!(
            "Created At: {}",
            format_created_at(record.created_at, layout.timezone)
        ),
    ];
    for line in &lines {
        builder.text(line, field);
    }
    builder.move_down();

    builder.text(
        "Thank you for visiting us!",
        TextStyle::new(Font::Helvetica, 20.0).centered(),
    );
    builder.move_down();

    let map_heading = TextStyle::new(Font::Helvetica, 22.0).color(Color::BLUE);
    builder.text(&layout.map_heading, map_heading.centered());
    builder.move_down();

    match &assets.map {
        Some(map) => {
            let handle = builder.embed_image(map);
            let top = builder.cursor_y() - MAP_LIFT;
            // stay inside the border on a single page
            let available = (PAGE_HEIGHT - 2.0 * BORDER_INSET - top).max(0.0);
            let (width, height) = fit(
                handle.width,
                handle.height,
                MAP_BOX_WIDTH,
                MAP_BOX_HEIGHT.min(available),
            );
            builder.draw_image(&handle, (PAGE_WIDTH - width) / 2.0, top, width, height);
        }
        None => builder.text("Map not available.", map_heading),
    }
}
