// src/models/mod.rs

pub mod api;

use crate::constants::{MAX_PERIOD, MAX_WEEK};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 一门课程上课的教学周集合：升序、无重复、所有值在 `1..=MAX_WEEK` 内。
///
/// 只能通过 [`WeekSet::from_weeks`] 或周次解析器构造，构造后不可变。
/// 相等性按值比较，与其原始文本无关。
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<u32>", into = "Vec<u32>")]
pub struct WeekSet(Vec<u32>);

impl WeekSet {
    pub fn from_weeks<I: IntoIterator<Item = u32>>(weeks: I) -> Self {
        let mut weeks: Vec<u32> = weeks.into_iter().filter(|w| (1..=MAX_WEEK).contains(w)).collect();
        weeks.sort_unstable();
        weeks.dedup();
        Self(weeks)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, week: u32) -> bool {
        self.0.binary_search(&week).is_ok()
    }
}

impl From<Vec<u32>> for WeekSet {
    fn from(weeks: Vec<u32>) -> Self {
        Self::from_weeks(weeks)
    }
}

impl From<WeekSet> for Vec<u32> {
    fn from(weeks: WeekSet) -> Self {
        weeks.0
    }
}

impl fmt::Display for WeekSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "[{}]", parts.join(","))
    }
}

/// 闭区间节次范围，`1 <= start <= end <= MAX_PERIOD`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodRange {
    start: u32,
    end: u32,
}

impl PeriodRange {
    /// 以两个端点构造范围，自动取小者为起点。任一端点为 0 或超过 `MAX_PERIOD` 时返回 `None`。
    pub fn new(a: u32, b: u32) -> Option<Self> {
        let valid = |n: u32| (1..=MAX_PERIOD).contains(&n);
        if !valid(a) || !valid(b) {
            return None;
        }
        Some(Self {
            start: a.min(b),
            end: a.max(b),
        })
    }

    pub fn single(period: u32) -> Option<Self> {
        Self::new(period, period)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// `other` 是否紧接在本范围之后 (无间隔、无重叠)。
    pub fn is_followed_by(&self, other: &PeriodRange) -> bool {
        self.end.checked_add(1) == Some(other.start)
    }
}

impl fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "第{}节", self.start)
        } else {
            write!(f, "第{}-{}节", self.start, self.end)
        }
    }
}

/// 从页面中原样提取出的一条课程记录，尚未经过去重与合并。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawCourseRecord {
    pub name: String,
    pub teacher: String,
    pub position: String,
    /// 星期几，1 = 周一 … 7 = 周日
    pub day: u8,
    pub periods: PeriodRange,
    pub weeks: WeekSet,
}

/// 去重合并后的最终课程记录，序列化格式即导入目标所需的 JSON 结构。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalCourseRecord {
    pub name: String,
    pub teacher: String,
    pub position: String,
    pub day: u8,
    pub start_section: u32,
    pub end_section: u32,
    pub weeks: WeekSet,
}

impl CanonicalCourseRecord {
    pub fn periods(&self) -> PeriodRange {
        PeriodRange {
            start: self.start_section,
            end: self.end_section,
        }
    }
}

impl From<RawCourseRecord> for CanonicalCourseRecord {
    fn from(raw: RawCourseRecord) -> Self {
        Self {
            name: raw.name,
            teacher: raw.teacher,
            position: raw.position,
            day: raw.day,
            start_section: raw.periods.start(),
            end_section: raw.periods.end(),
            weeks: raw.weeks,
        }
    }
}

impl From<CanonicalCourseRecord> for RawCourseRecord {
    fn from(record: CanonicalCourseRecord) -> Self {
        let periods = record.periods();
        Self {
            name: record.name,
            teacher: record.teacher,
            position: record.position,
            day: record.day,
            periods,
            weeks: record.weeks,
        }
    }
}

/// 适配器的提取结果：原始课程记录，以及页面上可能存在的学期文本。
#[derive(Debug, Clone, Default)]
pub struct ExtractedTimetable {
    pub records: Vec<RawCourseRecord>,
    pub term_label: Option<String>,
}

/// 一次导入流程的统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub school: String,
    pub raw_count: usize,
    pub canonical_count: usize,
}

impl ImportSummary {
    pub fn merged_count(&self) -> usize {
        self.raw_count.saturating_sub(self.canonical_count)
    }
}
