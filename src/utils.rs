// src/utils.rs

use crate::error::*;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static TERM_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{4})学年(春季|秋季)学期").unwrap());

/// 由学期文本推算开学日期：
/// `2024-2025学年秋季学期` -> `2024-09-01`，`2024-2025学年春季学期` -> `2025-03-01`。
pub fn parse_semester_start_date(term_label: &str) -> AppResult<String> {
    let format_error = || {
        AppError::SemesterFormat(format!(
            "'{}'，应为 \"XXXX-XXXX学年春季/秋季学期\"",
            term_label
        ))
    };
    let caps = TERM_LABEL_RE.captures(term_label).ok_or_else(format_error)?;
    let start_year: i32 = caps[1].parse().map_err(|_| format_error())?;
    let end_year: i32 = caps[2].parse().map_err(|_| format_error())?;
    if end_year != start_year + 1 {
        return Err(AppError::SemesterFormat(format!(
            "'{}'，后一年份应比前一年份大 1",
            term_label
        )));
    }

    let date = match &caps[3] {
        "春季" => NaiveDate::from_ymd_opt(end_year, 3, 1),
        _ => NaiveDate::from_ymd_opt(start_year, 9, 1),
    }
    .ok_or_else(format_error)?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// 学期参数：`xn=<学年>&xq=<学期>` 的 Base64 编码
pub fn encode_term_params(xn: &str, xq: &str) -> String {
    STANDARD.encode(format!("xn={}&xq={}", xn, xq))
}

/// 按显示宽度截断 (全角字符计 2)，超出时以 `...` 结尾
pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 { text.to_string() } else { format!("{}...", &text[..end_pos]) }
}
