// src/filename.rs

use regex::Regex;

/// Used when a `content-disposition` header is present but names no file.
pub const FALLBACK_FILE_NAME: &str = "tax-invoice.xlsx";

const COMPANY_PREFIX_LEN: usize = 20;

/// Pick the file name for a downloaded invoice.
pub fn derive_file_name(
    content_disposition: Option<&str>,
    company_name: &str,
    bill_number: &str,
) -> String {
    match content_disposition {
        Some(header) => {
            parse_content_disposition(header).unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
        }
        None => synthesize_file_name(company_name, bill_number),
    }
}

/// Extract the `filename` parameter of a `content-disposition` header value.
pub fn parse_content_disposition(header: &str) -> Option<String> {
    // `filename=` or the extended `filename*=`, quoted or bare
    let re = Regex::new(r#"(?i)filename(\*)?\s*=\s*("[^"]*"|'[^']*'|[^;\r\n]*)"#).ok()?;
    let caps = re.captures(header)?;
    let extended = caps.get(1).is_some();
    let raw = caps.get(2)?.as_str().trim();
    let mut name = raw.replace(['"', '\''], "");

    if extended {
        // RFC 5987: charset'lang'percent-encoded
        let mut parts = raw.splitn(3, '\'');
        if let (Some(_charset), Some(_lang), Some(encoded)) =
            (parts.next(), parts.next(), parts.next())
        {
            name = urlencoding::decode(encoded)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| encoded.to_string());
        }
    }

    let name = last_path_component(&name);
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

fn last_path_component(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

/// `{company}-{bill}-invoice.xlsx`, with both parts made file-name safe.
pub fn synthesize_file_name(company_name: &str, bill_number: &str) -> String {
    let company: String = sanitize(company_name)
        .chars()
        .take(COMPANY_PREFIX_LEN)
        .collect();
    let bill = sanitize(bill_number);
    format!("{company}-{bill}-invoice.xlsx")
}

/// One `-` per UTF-16 unit of every other char, so the 20-char company
/// prefix lands where a browser-side `substring(0, 20)` would put it.
fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.extend(std::iter::repeat_n('-', c.len_utf16()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_filename_is_unquoted() {
        let name = derive_file_name(Some(r#"attachment; filename="abc.xlsx""#), "x", "y");
        assert_eq!(name, "abc.xlsx");
    }

    #[test]
    fn bare_filename_stops_at_semicolon() {
        assert_eq!(
            parse_content_disposition("attachment; filename=report.xlsx; size=10").as_deref(),
            Some("report.xlsx")
        );
    }

    #[test]
    fn single_quoted_filename() {
        assert_eq!(
            parse_content_disposition("attachment; filename='q.xlsx'").as_deref(),
            Some("q.xlsx")
        );
    }

    #[test]
    fn extended_filename_is_percent_decoded() {
        assert_eq!(
            parse_content_disposition("attachment; filename*=UTF-8''tax%20invoice.xlsx")
                .as_deref(),
            Some("tax invoice.xlsx")
        );
    }

    #[test]
    fn directories_in_filename_are_dropped() {
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="../../etc/passwd""#).as_deref(),
            Some("passwd")
        );
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="C:\tmp\a.xlsx""#).as_deref(),
            Some("a.xlsx")
        );
    }

    #[test]
    fn header_without_filename_falls_back() {
        assert_eq!(derive_file_name(Some("attachment"), "Acme", "1"), FALLBACK_FILE_NAME);
        assert_eq!(
            derive_file_name(Some(r#"attachment; filename="""#), "Acme", "1"),
            FALLBACK_FILE_NAME
        );
    }

    #[test]
    fn missing_header_synthesizes_name() {
        assert_eq!(
            derive_file_name(None, "Acme & Co", "2025-26/007"),
            "Acme---Co-2025-26-007-invoice.xlsx"
        );
    }

    #[test]
    fn company_part_is_truncated_to_twenty_chars() {
        assert_eq!(
            synthesize_file_name("Shree Balaji Steel Traders Pvt Ltd", "42"),
            "Shree-Balaji-Steel-T-42-invoice.xlsx"
        );
    }

    #[test]
    fn non_ascii_letters_are_replaced() {
        assert_eq!(synthesize_file_name("Café", "Nº5"), "Caf--N-5-invoice.xlsx");
    }

    #[test]
    fn astral_chars_count_as_two_units() {
        assert_eq!(synthesize_file_name("Star 🌟 Metals", "1"), "Star----Metals-1-invoice.xlsx");
        assert_eq!(
            synthesize_file_name("🌟🌟🌟🌟🌟🌟🌟🌟🌟🌟🌟Acme", "9"),
            format!("{}-9-invoice.xlsx", "-".repeat(20))
        );
    }
}
