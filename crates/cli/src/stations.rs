//! Nearby-station table

use owo_colors::{OwoColorize, Stream};
use std::fmt::Write;
use truckstop_maps::PlaceResult;

const HEADERS: [&str; 4] = ["Station", "Address", "Distance", "Price"];

/// Shown in the price column when no price is known
pub const NO_PRICE: &str = "-";

/// Renders stations as an aligned table, one row per station.
///
/// Colors are only applied when stdout supports them.
pub fn render_table(stations: &[PlaceResult]) -> String {
    let rows: Vec<[String; 4]> = stations
        .iter()
        .map(|s| {
            [
                s.name.clone(),
                s.vicinity.clone(),
                s.distance.clone(),
                s.price
                    .as_ref()
                    .map_or_else(|| NO_PRICE.to_string(), |p| format!("${p}")),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header = pad_row(&HEADERS.map(String::from), &widths);
    let _ = writeln!(
        out,
        "{}",
        header.if_supports_color(Stream::Stdout, |t| t.bold())
    );
    let rule: usize = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    let _ = writeln!(out, "{}", "─".repeat(rule));
    for row in &rows {
        let _ = writeln!(out, "{}", pad_row(row, &widths));
    }
    out
}

/// Prints the table, or a dimmed notice when there is nothing to show.
pub fn print_stations(stations: &[PlaceResult]) {
    if stations.is_empty() {
        println!(
            "{}",
            "No stations to show".if_supports_color(Stream::Stdout, |t| t.dimmed())
        );
    } else {
        print!("{}", render_table(stations));
    }
}

fn pad_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(name: &str, distance: &str, price: Option<&str>) -> PlaceResult {
        PlaceResult {
            name: name.into(),
            vicinity: "100 Pacific Hwy".into(),
            distance: distance.into(),
            price: price.map(String::from),
            location: None,
        }
    }

    #[test]
    fn test_table_aligns_columns() {
        let table = render_table(&[
            station("Pilot Travel Center", "1.1 km", Some("15.42")),
            station("Shell", "Unknown", None),
        ]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Station"));
        assert!(lines[2].starts_with("Pilot Travel Center  100 Pacific Hwy"));
        assert!(lines[2].ends_with("$15.42"));
        assert!(lines[3].starts_with("Shell "));
        assert!(lines[3].ends_with(NO_PRICE));

        let address_col = lines[2].find("100 Pacific Hwy");
        assert_eq!(lines[3].find("100 Pacific Hwy"), address_col);
        assert_eq!(lines[2].find("1.1 km"), lines[3].find("Unknown"));
    }

    #[test]
    fn test_empty_table_has_only_header() {
        assert_eq!(render_table(&[]).lines().count(), 2);
    }
}
