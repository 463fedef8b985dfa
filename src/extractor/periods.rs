// src/extractor/periods.rs

use crate::models::PeriodRange;
use regex::Regex;
use std::sync::LazyLock;

/// 方括号内以连字符连接的整数序列，`节` 后缀可选: `[07-08-09-10节]`、`[10节]`、`[1-2]`
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\[【]\s*(\d+(?:\s*-\s*\d+)*)\s*节?\s*[\]】]").unwrap()
});

/// 从文本中解析节次范围。
///
/// 取第一个有效的方括号整数序列，起止节次为序列首尾两个数中的较小者与较大者。
/// 未找到时返回 `None`，调用方应跳过该课程块。
pub fn parse_periods(text: &str) -> Option<PeriodRange> {
    SECTION_RE.captures_iter(text).find_map(|caps| {
        let numbers: Vec<u32> = caps[1]
            .split('-')
            .map(|n| n.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .ok()?;
        PeriodRange::new(*numbers.first()?, *numbers.last()?)
    })
}

/// 解析不带方括号的 `"1-2"`、`"3"` 形式。
pub fn parse_period_slice(text: &str) -> Option<PeriodRange> {
    parse_periods(&format!("[{}]", text.trim()))
}

/// 按布局宽度推导各时间块覆盖的节次。
///
/// 第一个块覆盖 `1..=w0`，第二个块覆盖 `w0+1..=w0+w1`，依此类推。
/// 宽度为 0 的块按 1 节处理；超出最大节次的块被丢弃。
pub fn periods_from_weights(weights: &[u32]) -> Vec<PeriodRange> {
    let mut end: u32 = 0;
    weights
        .iter()
        .filter_map(|&weight| {
            let start = end.saturating_add(1);
            end = end.saturating_add(weight.max(1));
            PeriodRange::new(start, end)
        })
        .collect()
}
