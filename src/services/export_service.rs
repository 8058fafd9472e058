use rust_xlsxwriter::{Format, Workbook};

use crate::models::Registration;
use crate::utils::time::to_rfc3339;
use crate::utils::AppError;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const COLUMNS: [(&str, f64); 5] = [
    ("#", 6.0),
    ("Name", 28.0),
    ("Email", 34.0),
    ("Role", 14.0),
    ("Registered At", 28.0),
];

/// One header row plus one row per registration, in the order given.
pub fn registrations_workbook(registrations: &[Registration]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Registrations")?;

    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, *width)?;
    }

    for (index, reg) in registrations.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_number(row, 0, (index + 1) as f64)?;
        sheet.write_string(row, 1, &reg.name)?;
        sheet.write_string(row, 2, &reg.email)?;
        sheet.write_string(row, 3, reg.role.as_str())?;
        sheet.write_string(row, 4, to_rfc3339(reg.registered_at))?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// `registrations-<slug>.xlsx` with the slug limited to ASCII letters, digits and dashes.
pub fn export_file_name(event_title: &str) -> String {
    let mut slug = String::new();
    for c in event_title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "registrations.xlsx".to_string()
    } else {
        format!("registrations-{}.xlsx", slug)
    }
}

/// Content-Disposition value with both the plain and the RFC 5987 encoded name.
pub fn attachment_header(file_name: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        file_name,
        urlencoding::encode(file_name)
    )
}
