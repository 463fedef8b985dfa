// src/canonical.rs

//! 原始课程记录的去重与合并。
//!
//! 两种策略共享同一个输出约定：结果中不存在两条“同一门课”、同一天、同一组周次
//! 且节次首尾相接的记录。所有函数都不会失败，无法合并的记录原样保留。

use crate::{
    config::{GroupingKey, MergeStrategy},
    models::{CanonicalCourseRecord, PeriodRange, RawCourseRecord, WeekSet},
};
use itertools::Itertools;
use log::debug;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

/// 默认策略：精确去重 + 相邻节次合并，按 (课程名, 教师, 地点) 判断同一门课
pub fn canonicalize(records: Vec<RawCourseRecord>) -> Vec<CanonicalCourseRecord> {
    canonicalize_with(MergeStrategy::Adjacent, GroupingKey::NameTeacherPosition, records)
}

pub fn canonicalize_with(
    strategy: MergeStrategy,
    key: GroupingKey,
    records: Vec<RawCourseRecord>,
) -> Vec<CanonicalCourseRecord> {
    let input_count = records.len();
    let output = match strategy {
        MergeStrategy::Adjacent => merge_adjacent(records, key),
        MergeStrategy::WeekMatrix => merge_week_matrix(records, key),
        MergeStrategy::Disabled => sort_and_dedup(records, key)
            .into_iter()
            .map(CanonicalCourseRecord::from)
            .collect(),
    };
    debug!(
        "合并策略 {:?} / {:?}: {} 条原始记录 -> {} 条",
        strategy,
        key,
        input_count,
        output.len()
    );
    output
}

fn same_course(a: &RawCourseRecord, b: &RawCourseRecord, key: GroupingKey) -> bool {
    a.name == b.name
        && a.teacher == b.teacher
        && (!key.includes_position() || a.position == b.position)
}

/// 排序：同一天、同一组周次的记录聚在一起，其中同一门课的记录再按起始节次排列。
/// 末尾的字段保证这是一个全序，从而使结果与输入顺序无关。
fn compare(a: &RawCourseRecord, b: &RawCourseRecord, key: GroupingKey) -> Ordering {
    let course = |r: &RawCourseRecord| {
        (
            r.name.clone(),
            r.teacher.clone(),
            key.includes_position().then(|| r.position.clone()),
        )
    };
    a.day
        .cmp(&b.day)
        .then_with(|| a.weeks.cmp(&b.weeks))
        .then_with(|| course(a).cmp(&course(b)))
        .then_with(|| a.periods.cmp(&b.periods))
        .then_with(|| a.position.cmp(&b.position))
}

/// 排序后按全部字段精确去重，保留首次出现的记录
fn sort_and_dedup(mut records: Vec<RawCourseRecord>, key: GroupingKey) -> Vec<RawCourseRecord> {
    records.sort_by(|a, b| compare(a, b, key));
    records.into_iter().unique().collect()
}

/// 同一门课、同一天、同一组周次的记录按起始节次依次归入首尾相接的已有区间。
///
/// 按起始节次升序处理保证结果中不再存在可以首尾相接的两条记录，
/// 即便中间夹有重叠的区间，如 (1,2)、(1,3)、(3,4) 合并为 (1,4)、(1,3)。
fn merge_adjacent(records: Vec<RawCourseRecord>, key: GroupingKey) -> Vec<CanonicalCourseRecord> {
    let sorted = sort_and_dedup(records, key);
    let chunks = sorted.into_iter().chunk_by(|r| {
        (
            r.day,
            r.weeks.clone(),
            r.name.clone(),
            r.teacher.clone(),
            key.includes_position().then(|| r.position.clone()),
        )
    });

    let mut output = Vec::new();
    for (_, chunk) in &chunks {
        let mut merged: Vec<RawCourseRecord> = Vec::new();
        for record in chunk {
            let extended = merged
                .iter_mut()
                .find(|m| m.periods.is_followed_by(&record.periods))
                .and_then(|m| PeriodRange::new(m.periods.start(), record.periods.end()).map(|p| (m, p)));
            match extended {
                Some((m, periods)) => m.periods = periods,
                None => merged.push(record),
            }
        }
        output.extend(merged.into_iter().map(CanonicalCourseRecord::from));
    }
    output
}

/// 把一组节次拆分为若干段连续区间，如 {1,2,3,5,6} -> [(1,3), (5,6)]
fn contiguous_runs(periods: &BTreeSet<u32>) -> Vec<PeriodRange> {
    let mut runs = Vec::new();
    let mut iter = periods.iter().copied();
    let Some(first) = iter.next() else {
        return runs;
    };
    let (mut start, mut end) = (first, first);
    for period in iter {
        if end.checked_add(1) == Some(period) {
            end = period;
        } else {
            runs.extend(PeriodRange::new(start, end));
            (start, end) = (period, period);
        }
    }
    runs.extend(PeriodRange::new(start, end));
    runs
}

#[derive(Default)]
struct WeekMatrix {
    positions: BTreeSet<String>,
    periods_by_week: BTreeMap<u32, BTreeSet<u32>>,
}

/// 按周展开的合并：先按 (课程, 星期) 分组，逐周汇总上课节次并拆分为连续区间，
/// 再把节次区间完全相同的周归并为一条记录。
///
/// 适用于同一门课被拆成若干条周次、节次交错的记录的学校。
/// 当分组键不含地点时，取组内字典序最小的地点。
fn merge_week_matrix(records: Vec<RawCourseRecord>, key: GroupingKey) -> Vec<CanonicalCourseRecord> {
    let mut groups: BTreeMap<(u8, String, String, Option<String>), WeekMatrix> = BTreeMap::new();
    for record in records {
        let group_key = (
            record.day,
            record.name,
            record.teacher,
            key.includes_position().then(|| record.position.clone()),
        );
        let matrix = groups.entry(group_key).or_default();
        matrix.positions.insert(record.position);
        for &week in record.weeks.as_slice() {
            matrix
                .periods_by_week
                .entry(week)
                .or_default()
                .extend(record.periods.start()..=record.periods.end());
        }
    }

    let mut output = Vec::new();
    for ((day, name, teacher, _), matrix) in groups {
        let position = matrix.positions.into_iter().next().unwrap_or_default();

        let mut weeks_by_span: BTreeMap<PeriodRange, Vec<u32>> = BTreeMap::new();
        for (week, periods) in &matrix.periods_by_week {
            for span in contiguous_runs(periods) {
                weeks_by_span.entry(span).or_default().push(*week);
            }
        }

        output.extend(weeks_by_span.into_iter().map(|(span, weeks)| CanonicalCourseRecord {
            name: name.clone(),
            teacher: teacher.clone(),
            position: position.clone(),
            day,
            start_section: span.start(),
            end_section: span.end(),
            weeks: WeekSet::from_weeks(weeks),
        }));
    }

    output.sort_by(|a, b| {
        (a.day, a.start_section, a.end_section, &a.name, &a.teacher, &a.position, &a.weeks).cmp(&(
            b.day,
            b.start_section,
            b.end_section,
            &b.name,
            &b.teacher,
            &b.position,
            &b.weeks,
        ))
    });
    output
}
