// src/extractor/day_column.rs

use super::{
    ScheduleExtractor,
    periods::periods_from_weights,
    utils::{element_text, or_placeholder, selector, weekday_for_column},
    weeks::{parse_weeks, split_week_tokens},
};
use crate::{
    config::WeekdayOrder,
    constants,
    error::*,
    models::{ExtractedTimetable, RawCourseRecord, WeekSet},
};
use log::{debug, info, trace};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

static FLEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"flex\s*:\s*(\d+)").unwrap());

const TERM_LABEL_SELECTOR: &str = ".kbappTimeXQText";
const COURSE_SLOT_CLASS: &str = "kbappTimetableDayColumnConflictContainer";
const COURSE_ITEM_SELECTOR: &str = ".kbappTimetableCourseRenderCourseItem";
const COURSE_INFO_SELECTOR: &str = ".kbappTimetableCourseRenderCourseItemInfoText";

/// 课程详情行解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDetails {
    pub weeks: WeekSet,
    pub teacher: String,
    pub position: String,
}

/// 解析 `"1-8周,10周(双) 张三 浑南 A101"` 形式的详情：
/// 周次片段之外的第一个词为教师，其余为地点。
pub fn parse_course_details(detail: &str) -> CourseDetails {
    let (weeks_text, remaining) = split_week_tokens(detail);
    let mut parts = remaining
        .split_whitespace()
        .map(|part| part.trim_matches(|c| c == ',' || c == '，'))
        .filter(|part| !part.is_empty());
    let teacher = parts.next().map(str::to_string);
    let position = parts.collect::<Vec<_>>().join(" ");

    CourseDetails {
        weeks: parse_weeks(&weeks_text),
        teacher: or_placeholder(teacher, constants::UNKNOWN_TEACHER),
        position: or_placeholder(Some(position), constants::UNKNOWN_POSITION),
    }
}

/// 按天分列、以 flex 宽度表示节次的课表 (Sunday-first 常见)。
///
/// 每一列的直接子元素依次占据若干节，`style="flex: 2 1 0%"` 中的第一个数即节数；
/// 带有冲突容器 class 的子元素中包含一门或多门课程。
pub struct DayColumnExtractor {
    column_selector: String,
    weekday_order: WeekdayOrder,
}

impl DayColumnExtractor {
    pub fn new(column_selector: String, weekday_order: WeekdayOrder) -> Self {
        Self { column_selector, weekday_order }
    }

    fn flex_weight(slot: ElementRef<'_>) -> u32 {
        slot.value()
            .attr("style")
            .and_then(|style| FLEX_RE.captures(style))
            .and_then(|caps| caps[1].parse().ok())
            .unwrap_or_else(|| {
                trace!("时间块缺少 flex 宽度，按 1 节处理");
                1
            })
    }

    fn is_course_slot(slot: ElementRef<'_>) -> bool {
        slot.value().classes().any(|class| class == COURSE_SLOT_CLASS)
    }
}

impl ScheduleExtractor for DayColumnExtractor {
    fn extract(&self, document: &str) -> AppResult<ExtractedTimetable> {
        let html = Html::parse_document(document);
        let columns: Vec<ElementRef<'_>> = html.select(&selector(&self.column_selector)?).collect();
        if columns.is_empty() {
            return Err(AppError::TableNotFound {
                locator: self.column_selector.clone(),
            });
        }

        let term_label = html
            .select(&selector(TERM_LABEL_SELECTOR)?)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty());

        let item_selector = selector(COURSE_ITEM_SELECTOR)?;
        let info_selector = selector(COURSE_INFO_SELECTOR)?;

        let column_count = columns.len();
        let mut records = Vec::new();
        for (index, column) in columns.into_iter().enumerate() {
            let Some(day) = weekday_for_column(index, self.weekday_order) else {
                continue;
            };

            let slots: Vec<ElementRef<'_>> = column.children().filter_map(ElementRef::wrap).collect();
            let weights: Vec<u32> = slots.iter().map(|&slot| Self::flex_weight(slot)).collect();

            for (slot, periods) in slots.iter().zip(periods_from_weights(&weights)) {
                if !Self::is_course_slot(*slot) {
                    continue;
                }
                for item in slot.select(&item_selector) {
                    let infos: Vec<String> = item.select(&info_selector).map(element_text).collect();
                    let details = parse_course_details(infos.get(1).map(String::as_str).unwrap_or_default());
                    if details.weeks.is_empty() {
                        debug!("星期{} {} 的课程缺少周次，跳过: {:?}", day, periods, infos);
                        continue;
                    }
                    records.push(RawCourseRecord {
                        name: or_placeholder(infos.first().cloned(), constants::UNKNOWN_COURSE),
                        teacher: details.teacher,
                        position: details.position,
                        day,
                        periods,
                        weeks: details.weeks,
                    });
                }
            }
        }

        info!("从 {} 个按天分列的课表列中提取到 {} 条原始课程记录", column_count, records.len());
        Ok(ExtractedTimetable { records, term_label })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_slot(flex: u32, items: &[(&str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(name, detail)| {
                format!(
                    r#"<div class="kbappTimetableCourseRenderCourseItem"><span class="kbappTimetableCourseRenderCourseItemInfoText">{}</span><span class="kbappTimetableCourseRenderCourseItemInfoText">{}</span><span class="kbappTimetableCourseRenderCourseItemInfoText">备注</span></div>"#,
                    name, detail
                )
            })
            .collect();
        format!(
            r#"<div class="kbappTimetableDayColumnConflictContainer" style="flex: {} 1 0%;">{}</div>"#,
            flex, items
        )
    }

    fn empty_slot(flex: u32) -> String {
        format!(r#"<div class="kbappTimetableDayColumnEmpty" style="flex: {} 1 0%;"></div>"#, flex)
    }

    fn column(slots: &[String]) -> String {
        format!(r#"<div class="kbappTimetableDayColumnRoot">{}</div>"#, slots.concat())
    }

    #[test]
    fn test_parse_course_details() {
        let details = parse_course_details("1-8周,10周 张三 浑南 A101");
        assert_eq!(details.weeks.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8, 10]);
        assert_eq!(details.teacher, "张三");
        assert_eq!(details.position, "浑南 A101");

        let details = parse_course_details("3-9周(单)");
        assert_eq!(details.weeks.as_slice(), &[3, 5, 7, 9]);
        assert_eq!(details.teacher, constants::UNKNOWN_TEACHER);
        assert_eq!(details.position, constants::UNKNOWN_POSITION);
    }

    #[test]
    fn test_extract_sunday_first_columns_with_flex_periods() {
        let sunday = column(&[empty_slot(12)]);
        let monday = column(&[
            course_slot(2, &[("高等数学", "1-16周 王老师 A101")]),
            empty_slot(2),
            course_slot(3, &[("大学物理", "2-8周(双) 李老师 B202"), ("物理实验", "9周 赵老师 实验楼")]),
        ]);
        let html = format!(
            r#"<html><body><div class="kbappTimeXQText">2024-2025学年秋季学期</div>{}{}</body></html>"#,
            sunday, monday
        );

        let extractor = DayColumnExtractor::new(".kbappTimetableDayColumnRoot".into(), WeekdayOrder::SundayFirst);
        let extracted = extractor.extract(&html).unwrap();

        assert_eq!(extracted.term_label.as_deref(), Some("2024-2025学年秋季学期"));
        assert_eq!(extracted.records.len(), 3);

        let math = &extracted.records[0];
        assert_eq!(math.day, 1);
        assert_eq!((math.periods.start(), math.periods.end()), (1, 2));
        assert_eq!(math.teacher, "王老师");

        let physics = &extracted.records[1];
        assert_eq!((physics.periods.start(), physics.periods.end()), (5, 7));
        assert_eq!(physics.weeks.as_slice(), &[2, 4, 6, 8]);

        let lab = &extracted.records[2];
        assert_eq!(lab.name, "物理实验");
        assert_eq!((lab.periods.start(), lab.periods.end()), (5, 7));
        assert_eq!(lab.weeks.as_slice(), &[9]);
    }

    #[test]
    fn test_sunday_column_maps_to_day_seven() {
        let html = column(&[course_slot(2, &[("周日讲座", "1周 钱老师 礼堂")])]);
        let extractor = DayColumnExtractor::new(".kbappTimetableDayColumnRoot".into(), WeekdayOrder::SundayFirst);
        let records = extractor.extract(&html).unwrap().records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].day, 7);
    }

    #[test]
    fn test_items_without_weeks_are_dropped() {
        let html = column(&[course_slot(2, &[("无周次课程", "王老师 A101")])]);
        let extractor = DayColumnExtractor::new(".kbappTimetableDayColumnRoot".into(), WeekdayOrder::SundayFirst);
        assert!(extractor.extract(&html).unwrap().records.is_empty());
    }

    #[test]
    fn test_missing_columns_is_structural_failure() {
        let extractor = DayColumnExtractor::new(".kbappTimetableDayColumnRoot".into(), WeekdayOrder::SundayFirst);
        assert!(matches!(
            extractor.extract("<html><body></body></html>"),
            Err(AppError::TableNotFound { .. })
        ));
    }
}
