//! Bills archive - the ZIP served by `GET /events/{id}/download-bills`
//!
//! The archive holds a plain-text summary of the event's bills and cost sharing,
//! plus a `receipts/` folder. Inline receipts are stored as the decoded file;
//! remote ones as a small `.info.txt` note pointing at the URL.

use crate::dtos::{AttendanceDTO, EventDetailDTO};
use crate::receipt::decode_data_url;
use crate::split::equal_split;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{self, Write as _};
use std::io::{Cursor, Write};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

lazy_static! {
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^a-zA-Z0-9]").expect("valid regex");
}

/// Download name: `Team dinner` -> `Team_dinner_Bills.zip`
pub fn archive_file_name(title: &str) -> String {
    format!("{}_Bills.zip", NON_ALPHANUMERIC.replace_all(title, "_"))
}

/// Strips path separators so entries cannot escape their folder.
fn entry_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Formats minor units as rupees with Indian digit grouping: `12345678` -> `₹1,23,456.78`
pub fn format_inr(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let rupees = (abs / 100).to_string();
    let paise = abs % 100;

    let grouped = if rupees.len() <= 3 {
        rupees
    } else {
        let (head, last_three) = rupees.split_at(rupees.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{}", groups.join(","), last_three)
    };

    format!("{sign}₹{grouped}.{paise:02}")
}

fn attendee_label(attendance: &AttendanceDTO) -> String {
    match &attendance.user {
        Some(user) => format!(
            "{} ({})",
            user.name.as_deref().unwrap_or("Unknown User"),
            user.email
        ),
        None => attendance.attendance.email.clone(),
    }
}

/// Plain-text summary of the event's bills and of the equal split.
pub fn bill_summary(detail: &EventDetailDTO) -> Result<String, fmt::Error> {
    let event = &detail.event;
    let mut out = String::new();

    let creator = detail
        .creator
        .as_ref()
        .and_then(|c| c.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    writeln!(out, "Event: {}", event.title)?;
    writeln!(out, "Date: {}", event.date.format("%d/%m/%Y"))?;
    writeln!(
        out,
        "Location: {}",
        event.location.as_deref().unwrap_or("Not specified")
    )?;
    writeln!(out, "Created by: {}\n", creator)?;

    out.push_str("=== BILLS SUMMARY ===\n\n");

    for (index, bill) in detail.bills.iter().enumerate() {
        let payer = bill
            .payer
            .as_ref()
            .map(|p| p.name.clone().unwrap_or_else(|| p.email.clone()))
            .unwrap_or_else(|| "Unknown".to_string());

        writeln!(out, "Bill {}:", index + 1)?;
        writeln!(out, "  Paid by: {}", payer)?;
        writeln!(out, "  Subtotal: {}", format_inr(bill.bill.subtotal_cents))?;
        writeln!(out, "  Tax: {}", format_inr(bill.bill.tax_cents))?;
        writeln!(out, "  Tip: {}", format_inr(bill.bill.tip_cents))?;
        writeln!(out, "  Total: {}", format_inr(bill.bill.total_cents))?;
        if let Some(notes) = bill.bill.notes.as_deref().filter(|n| !n.is_empty()) {
            writeln!(out, "  Notes: {}", notes)?;
        }
        if !bill.items.is_empty() {
            out.push_str("  Items:\n");
            for item in &bill.items {
                writeln!(
                    out,
                    "    - {}: {} x {}",
                    item.label,
                    format_inr(item.amount_cents),
                    item.quantity
                )?;
            }
        }
        out.push('\n');
    }

    let confirmed: Vec<&AttendanceDTO> = detail
        .attendances
        .iter()
        .filter(|a| a.attendance.is_confirmed())
        .collect();
    let ids: Vec<i64> = confirmed.iter().map(|a| a.attendance.attendance_id).collect();
    let split = equal_split(detail.total_amount(), &ids);

    out.push_str("=== COST SHARING ===\n\n");
    writeln!(out, "Total Event Cost: {}", format_inr(split.total_cents))?;
    writeln!(out, "Number of Attendees: {}", split.attendee_count)?;
    writeln!(out, "Cost per Person: {}\n", format_inr(split.per_person_cents))?;

    out.push_str("Attendees:\n");
    for attendance in confirmed {
        let share = split
            .share_of(attendance.attendance.attendance_id)
            .unwrap_or_default();
        writeln!(
            out,
            "  - {}: {}",
            attendee_label(attendance),
            format_inr(share)
        )?;
    }

    Ok(out)
}

/// Builds the ZIP archive in memory.
pub fn build_bills_archive(detail: &EventDetailDTO) -> ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.start_file(
        format!("{} - Bill Summary.txt", entry_name(&detail.event.title)),
        options,
    )?;
    let summary = bill_summary(detail).map_err(std::io::Error::other)?;
    zip.write_all(summary.as_bytes())?;

    let attachments: Vec<_> = detail.bills.iter().flat_map(|b| b.attachments.iter()).collect();
    if !attachments.is_empty() {
        zip.add_directory("receipts/", options)?;
    }

    for attachment in attachments {
        let base_name = format!(
            "receipts/{}_{}",
            attachment.attachment_id,
            entry_name(&attachment.file_name)
        );
        match decode_data_url(&attachment.url) {
            Some(bytes) => {
                zip.start_file(base_name, options)?;
                zip.write_all(&bytes)?;
            }
            None => {
                let info = format!(
                    "Receipt: {}\nSize: {} bytes\nUploaded: {}\nURL: {}\n",
                    attachment.file_name,
                    attachment.size_bytes,
                    attachment.created_at.to_rfc3339(),
                    attachment.url
                );
                zip.start_file(format!("{base_name}.info.txt"), options)?;
                zip.write_all(info.as_bytes())?;
            }
        }
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::{BillDTO, UserDTO};
    use crate::entities::{Attachment, Attendance, AttendanceStatus, Bill, Event};
    use chrono::{TimeZone, Utc};
    use std::io::Read;

    #[test]
    fn test_format_inr_grouping() {
        assert_eq!(format_inr(0), "₹0.00");
        assert_eq!(format_inr(99_900), "₹999.00");
        assert_eq!(format_inr(123_456), "₹1,234.56");
        assert_eq!(format_inr(12_345_678), "₹1,23,456.78");
        assert_eq!(format_inr(1_234_567_890), "₹1,23,45,678.90");
        assert_eq!(format_inr(-5), "-₹0.05");
    }

    #[test]
    fn test_archive_file_name() {
        assert_eq!(archive_file_name("Team dinner #2"), "Team_dinner__2_Bills.zip");
    }

    fn user(id: &str, name: &str) -> UserDTO {
        UserDTO {
            id: id.to_string(),
            name: Some(name.to_string()),
            email: format!("{}@example.com", name.to_lowercase()),
            image: None,
        }
    }

    fn attendance(id: i64, who: &UserDTO, status: AttendanceStatus) -> AttendanceDTO {
        AttendanceDTO {
            attendance: Attendance {
                attendance_id: id,
                event_id: 1,
                user_id: Some(who.id.clone()),
                email: who.email.clone(),
                status,
                invited_by_id: None,
                is_paid: false,
                paid_by_id: None,
                created_at: Utc::now(),
            },
            user: Some(who.clone()),
            invited_by: None,
            paid_by: None,
            event: None,
        }
    }

    fn sample_detail() -> EventDetailDTO {
        let alice = user("u1", "Alice");
        let bob = user("u2", "Bob");
        let created_at = Utc.with_ymd_and_hms(2025, 3, 10, 22, 0, 0).unwrap();
        EventDetailDTO {
            event: Event {
                event_id: 1,
                wip_window_id: 1,
                title: "Team dinner".to_string(),
                date: Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap(),
                location: None,
                notes: None,
                creator_id: alice.id.clone(),
                paid_by_id: None,
                created_at,
            },
            creator: Some(alice.clone()),
            wip_window: None,
            paid_by: None,
            attendances: vec![
                attendance(1, &alice, AttendanceStatus::Confirmed),
                attendance(2, &bob, AttendanceStatus::Confirmed),
            ],
            bills: vec![BillDTO {
                bill: Bill {
                    bill_id: 1,
                    event_id: 1,
                    payer_id: bob.id.clone(),
                    subtotal_cents: 1001,
                    tax_cents: 0,
                    tip_cents: 0,
                    total_cents: 1001,
                    currency: "INR".to_string(),
                    notes: Some("Dinner".to_string()),
                    created_at,
                },
                payer: Some(bob.clone()),
                attachments: vec![
                    Attachment {
                        attachment_id: 1,
                        bill_id: 1,
                        file_name: "receipt.jpg".to_string(),
                        url: "data:image/jpeg;base64,aGVsbG8=".to_string(),
                        size_bytes: 5,
                        mime_type: "image/jpeg".to_string(),
                        uploaded_by_id: bob.id.clone(),
                        created_at,
                    },
                    Attachment {
                        attachment_id: 2,
                        bill_id: 1,
                        file_name: "scan.pdf".to_string(),
                        url: "https://files.example.com/scan.pdf".to_string(),
                        size_bytes: 2048,
                        mime_type: "application/pdf".to_string(),
                        uploaded_by_id: bob.id.clone(),
                        created_at,
                    },
                ],
                items: vec![],
            }],
        }
    }

    #[test]
    fn test_bill_summary_contents() {
        let summary = bill_summary(&sample_detail()).unwrap();
        assert!(summary.starts_with("Event: Team dinner\n"));
        assert!(summary.contains("Location: Not specified"));
        assert!(summary.contains("  Paid by: Bob"));
        assert!(summary.contains("  Total: ₹10.01"));
        assert!(summary.contains("Number of Attendees: 2"));
        assert!(summary.contains("Cost per Person: ₹5.00"));
        // the odd cent lands on the earliest attendance
        assert!(summary.contains("  - Alice (alice@example.com): ₹5.01"));
        assert!(summary.contains("  - Bob (bob@example.com): ₹5.00"));
    }

    #[test]
    fn test_archive_entries() {
        let bytes = build_bills_archive(&sample_detail()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"Team dinner - Bill Summary.txt".to_string()));
        assert!(names.contains(&"receipts/1_receipt.jpg".to_string()));
        assert!(names.contains(&"receipts/2_scan.pdf.info.txt".to_string()));

        let mut inline = String::new();
        archive
            .by_name("receipts/1_receipt.jpg")
            .unwrap()
            .read_to_string(&mut inline)
            .unwrap();
        assert_eq!(inline, "hello");

        let mut info = String::new();
        archive
            .by_name("receipts/2_scan.pdf.info.txt")
            .unwrap()
            .read_to_string(&mut info)
            .unwrap();
        assert!(info.contains("URL: https://files.example.com/scan.pdf"));
    }
}
