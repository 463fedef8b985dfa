// src/extractor/kbcontent.rs

use super::{
    ScheduleExtractor,
    periods::parse_periods,
    utils::{self, or_placeholder, selector, strip_tags, weekday_for_column},
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

static BLOCK_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-{5,}\s*<br\s*/?>").unwrap());
static LINE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<span[^>]*>.*?</span>").unwrap());

const DETAIL_SELECTOR: &str = r#"div[class*="kbcontent"][style*="display: none"]"#;
const TEACHER_SELECTOR: &str = r#"font[title="老师"]"#;
const POSITION_SELECTOR: &str = r#"font[title="教室"]"#;
const WEEKS_SECTION_SELECTOR: &str = r#"font[title="周次(节次)"]"#;

/// 强智类教务系统的 `#kbtable` 课表。
///
/// 第一行为表头；每个 `td` 对应一天，其中隐藏的 `div.kbcontent` 保存完整信息，
/// 同一单元格的多门课以一行短横线分隔。课程块形如：
///
/// ```html
/// 高等数学<br><font title="老师">王老师</font><br>
/// <font title="周次(节次)">5-15,17(周)[01-02节]</font><br><font title="教室">A101</font><br>
/// ```
pub struct KbContentExtractor {
    table_selector: String,
    weekday_order: WeekdayOrder,
}

impl KbContentExtractor {
    pub fn new(table_selector: String, weekday_order: WeekdayOrder) -> Self {
        Self { table_selector, weekday_order }
    }

    fn parse_block(&self, block_html: &str, day: u8) -> AppResult<Option<RawCourseRecord>> {
        if strip_tags(block_html).is_empty() {
            return Ok(None);
        }

        let fragment = Html::parse_fragment(block_html);
        let font_text = |css: &str| -> AppResult<Option<String>> {
            Ok(fragment.select(&selector(css)?).next().map(utils::element_text))
        };

        let weeks_section = font_text(WEEKS_SECTION_SELECTOR)?.unwrap_or_default();
        let Some(periods) = parse_periods(&weeks_section) else {
            debug!("课程块缺少节次信息，跳过: '{}'", weeks_section);
            return Ok(None);
        };
        let weeks = parse_weeks(&weeks_section);
        if weeks.is_empty() {
            debug!("课程块周次为空，跳过: '{}'", weeks_section);
            return Ok(None);
        }

        let first_line = LINE_BREAK_RE.split(block_html.trim()).next().unwrap_or_default();
        let name = strip_tags(&SPAN_RE.replace_all(first_line, ""));

        Ok(Some(RawCourseRecord {
            name: or_placeholder(Some(name), constants::UNKNOWN_COURSE),
            teacher: or_placeholder(font_text(TEACHER_SELECTOR)?, constants::UNKNOWN_TEACHER),
            position: or_placeholder(font_text(POSITION_SELECTOR)?, constants::UNKNOWN_POSITION),
            day,
            periods,
            weeks,
        }))
    }
}

impl ScheduleExtractor for KbContentExtractor {
    fn extract(&self, document: &str) -> AppResult<ExtractedTimetable> {
        let html = Html::parse_document(document);
        let table = html
            .select(&selector(&self.table_selector)?)
            .next()
            .ok_or_else(|| AppError::TableNotFound {
                locator: self.table_selector.clone(),
            })?;

        let row_selector = selector("tr")?;
        let cell_selector = selector("td")?;
        let detail_selector = selector(DETAIL_SELECTOR)?;

        let mut records = Vec::new();
        for row in table.select(&row_selector).skip(1) {
            for (index, cell) in row.select(&cell_selector).enumerate() {
                let Some(day) = weekday_for_column(index, self.weekday_order) else {
                    continue;
                };
                let Some(detail) = cell.select(&detail_selector).next() else {
                    continue;
                };
                let raw_content = detail.inner_html();
                if strip_tags(&raw_content).is_empty() {
                    continue;
                }

                for block in BLOCK_SEPARATOR_RE.split(&raw_content) {
                    if block.trim().is_empty() {
                        continue;
                    }
                    if let Some(record) = self.parse_block(block, day)? {
                        records.push(record);
                    }
                }
            }
        }

        info!("从 '{}' 中提取到 {} 条原始课程记录", self.table_selector, records.len());
        Ok(ExtractedTimetable { records, term_label: None })
    }
}
