// src/extractor/matrix_table.rs

use super::{
    ScheduleExtractor,
    periods::parse_period_slice,
    utils::{child_text_lines, or_placeholder, selector, weekday_for_column},
    weeks::parse_weeks,
};
use crate::{
    config::WeekdayOrder,
    constants,
    error::*,
    models::{ExtractedTimetable, RawCourseRecord},
};
use log::{debug, info};
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

/// `1-8,10[1-2]`：方括号前为周次，方括号内为节次
static DESCRIPTOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*)\[(.*)\]").unwrap());

const CELL_SELECTOR: &str = "td.td";
const COURSE_BLOCK_SELECTOR: &str = r#"div[style*="padding-bottom:5px"]"#;

/// `#mytable` 课表：每个 `td.td` 为一天，其中每个课程块是若干行文本：
/// 课程名、教师、`周次[节次]`、地点 (可缺省)。
///
/// 同一门课常被拆成多条按周次、节次交错的记录，需配合按周展开的合并策略使用。
pub struct MatrixTableExtractor {
    table_selector: String,
    weekday_order: WeekdayOrder,
}

impl MatrixTableExtractor {
    pub fn new(table_selector: String, weekday_order: WeekdayOrder) -> Self {
        Self { table_selector, weekday_order }
    }

    fn parse_lines(lines: &[String], day: u8) -> Option<RawCourseRecord> {
        if lines.len() < 3 {
            debug!("课程块行数不足，跳过: {:?}", lines);
            return None;
        }
        let caps = DESCRIPTOR_RE.captures(&lines[2])?;
        let periods = parse_period_slice(&caps[2])?;
        let weeks = parse_weeks(&caps[1]);
        if weeks.is_empty() {
            debug!("课程块周次为空，跳过: '{}'", lines[2]);
            return None;
        }

        Some(RawCourseRecord {
            name: or_placeholder(lines.first().cloned(), constants::UNKNOWN_COURSE),
            teacher: or_placeholder(lines.get(1).cloned(), constants::UNKNOWN_TEACHER),
            position: or_placeholder(lines.get(3).cloned(), constants::UNKNOWN_POSITION),
            day,
            periods,
            weeks,
        })
    }
}

impl ScheduleExtractor for MatrixTableExtractor {
    fn extract(&self, document: &str) -> AppResult<ExtractedTimetable> {
        let html = Html::parse_document(document);
        let table = html
            .select(&selector(&self.table_selector)?)
            .next()
            .ok_or_else(|| AppError::TableNotFound {
                locator: self.table_selector.clone(),
            })?;

        let row_selector = selector("tr")?;
        let cell_selector = selector(CELL_SELECTOR)?;
        let block_selector = selector(COURSE_BLOCK_SELECTOR)?;

        let mut records = Vec::new();
        for row in table.select(&row_selector) {
            for (index, cell) in row.select(&cell_selector).enumerate() {
                let Some(day) = weekday_for_column(index, self.weekday_order) else {
                    continue;
                };
                records.extend(
                    cell.select(&block_selector)
                        .filter_map(|block| Self::parse_lines(&child_text_lines(block), day)),
                );
            }
        }

        info!("从 '{}' 中提取到 {} 条原始课程记录", self.table_selector, records.len());
        Ok(ExtractedTimetable { records, term_label: None })
    }
}
