//! # Picking List Export
//!
//! Renders a [`PickingList`] for warehouse staff, as CSV (spreadsheets,
//! handheld scanners) or as a printable HTML page.
//!
//! Both renderers return the document as a `String`; writing it somewhere is
//! the caller's job. The HTML page comes from `templates/picking_list.html`.
//!
//! ```text
//! Product Name,SKU,Quantity,Location,Priority,Status
//! Brake pad,BRK-01,2,A-01-2-C,Normal,Pending
//! Coolant,CLT-5L,1,Unassigned,High,Pending
//! ```

use askama::Template;

use crate::error::{CoreError, CoreResult};
use crate::picking::PickingList;

/// Column headers, in output order.
pub const CSV_HEADERS: [&str; 6] = ["Product Name", "SKU", "Quantity", "Location", "Priority", "Status"];

/// Status written for lines on a freshly generated list.
pub const PENDING_STATUS: &str = "Pending";

/// Renders the list as CSV with a header row.
pub fn picking_list_to_csv(list: &PickingList) -> CoreResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(CSV_HEADERS).map_err(export_error)?;

    for item in &list.items {
        writer
            .write_record([
                item.product_name.as_str(),
                item.sku.as_str(),
                &item.quantity.to_string(),
                &item.location_label(),
                item.priority.label(),
                PENDING_STATUS,
            ])
            .map_err(export_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))
}

fn export_error(err: csv::Error) -> CoreError {
    CoreError::Export(err.to_string())
}

/// Printable picking list page. Values are HTML-escaped by the template.
#[derive(Template)]
#[template(path = "picking_list.html")]
pub struct PickingListPage<'a> {
    pub title: &'a str,
    pub list: &'a PickingList,
}

/// Renders the list as a standalone, print-friendly HTML page.
pub fn picking_list_to_html(list: &PickingList, title: &str) -> CoreResult<String> {
    PickingListPage { title, list }
        .render()
        .map_err(|e| CoreError::Export(e.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picking::{PickPriority, PickingListItem};
    use crate::types::BinLocation;

    fn sample_list() -> PickingList {
        PickingList {
            items: vec![
                PickingListItem {
                    product_id: "p1".into(),
                    product_name: "Brake pad, front".into(),
                    sku: "BRK-01".into(),
                    quantity: 2,
                    location: Some(BinLocation::new("A", "01", "2", "C")),
                    priority: PickPriority::Normal,
                },
                PickingListItem {
                    product_id: "p2".into(),
                    product_name: "<Coolant>".into(),
                    sku: "CLT-5L".into(),
                    quantity: 1,
                    location: None,
                    priority: PickPriority::High,
                },
            ],
            total_items: 3,
            estimated_pick_time: 125,
        }
    }

    #[test]
    fn test_csv_layout() {
        let csv = picking_list_to_csv(&sample_list()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Product Name,SKU,Quantity,Location,Priority,Status");
        // Comma in the name forces quoting.
        assert_eq!(lines[1], "\"Brake pad, front\",BRK-01,2,A-01-2-C,Normal,Pending");
        assert_eq!(lines[2], "<Coolant>,CLT-5L,1,Unassigned,High,Pending");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_empty_list_has_header_only() {
        let list = PickingList {
            items: vec![],
            total_items: 0,
            estimated_pick_time: 0,
        };
        let csv = picking_list_to_csv(&list).unwrap();
        assert_eq!(csv.trim_end(), CSV_HEADERS.join(","));
    }

    #[test]
    fn test_html_escapes_values() {
        let html = picking_list_to_html(&sample_list(), "Pick list Q-1 & friends").unwrap();

        // Escaped, whichever entity form the escaper picks.
        assert!(!html.contains("<Coolant>"));
        assert!(html.contains("Coolant&"));
        assert!(!html.contains("Q-1 & friends"));
        assert!(html.contains("<title>Pick list Q-1 &"));
        assert!(html.contains("Unassigned"));
        assert!(html.contains("Estimated time: 3 min"));
        assert!(html.contains("class=\"priority-high\""));
    }
}
