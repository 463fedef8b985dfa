// src/extractor/weeks.rs

//! 周次文本解析。
//!
//! 语法 (去除装饰之后):
//!
//! ```text
//! weeks  := token (SEP token)*        SEP := ',' | '，' | '、' | ';' | '；'
//! token  := NUM ( RANGE NUM )? '周'? parity? '周'?
//! RANGE  := '-' | '~'
//! parity := ( '(' | '（' ) ( '单' | '双' ) ( ')' | '）' )
//! ```
//!
//! 解析前会去除 HTML 标签、方括号内的节次标注 (如 `[09-10节]`) 以及 `(周)`，
//! 避免节次被误读为周次。无法识别或超过最大周次的 token 直接跳过。

use crate::{constants::MAX_WEEK, models::WeekSet};
use log::trace;
use regex::Regex;
use std::sync::LazyLock;

static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<[^>]*>|&nbsp;|\[[^\]]*\]|【[^】]*】|[(（]\s*周\s*[)）]").unwrap()
});
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,，、;；]").unwrap());
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:[-~](\d+))?周?(?:[(（]([单双])[)）])?周?$").unwrap()
});
static WEEK_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\s*[-~]\s*\d+)?\s*周(?:\s*[(（][单双][)）])?").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parity {
    Any,
    Odd,
    Even,
}

impl Parity {
    fn accepts(self, week: u32) -> bool {
        match self {
            Parity::Any => true,
            Parity::Odd => week % 2 == 1,
            Parity::Even => week % 2 == 0,
        }
    }
}

/// 将周次文本解析为升序、去重的周次集合，如 `"5-15,17"`、`"5-15周(单)"`。
///
/// 空输入返回空集合；格式错误的部分被忽略，其余部分照常解析。
pub fn parse_weeks(text: &str) -> WeekSet {
    let cleaned = MARKUP_RE.replace_all(text, "");
    let cleaned = WHITESPACE_RE.replace_all(&cleaned, "");
    if cleaned.is_empty() {
        return WeekSet::default();
    }

    let weeks = SEPARATOR_RE
        .split(&cleaned)
        .filter(|token| !token.is_empty())
        .flat_map(|token| {
            let expanded = expand_token(token);
            if expanded.is_empty() {
                trace!("忽略无法识别的周次片段: '{}'", token);
            }
            expanded
        });

    WeekSet::from_weeks(weeks)
}

fn expand_token(token: &str) -> Vec<u32> {
    let Some(caps) = TOKEN_RE.captures(token) else {
        return vec![];
    };
    let Ok(first) = caps[1].parse::<u32>() else {
        return vec![];
    };
    let last = match caps.get(2) {
        Some(m) => match m.as_str().parse::<u32>() {
            Ok(n) => n,
            Err(_) => return vec![],
        },
        None => first,
    };
    let parity = match caps.get(3).map(|m| m.as_str()) {
        Some("单") => Parity::Odd,
        Some("双") => Parity::Even,
        _ => Parity::Any,
    };

    let (low, high) = (first.min(last), first.max(last));
    if high > MAX_WEEK {
        return vec![];
    }
    (low..=high).filter(|&w| parity.accepts(w)).collect()
}

/// 从一段自由文本中拆出所有带 `周` 后缀的周次片段。
///
/// 返回 (以逗号拼接的周次文本, 去掉周次片段后的剩余文本)，
/// 适用于 `"1-8周,10周(双) 张三 浑南A101"` 这类把周次、教师、地点写在一起的描述。
pub fn split_week_tokens(text: &str) -> (String, String) {
    let tokens: Vec<&str> = WEEK_TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect();
    let remainder = WEEK_TOKEN_RE.replace_all(text, " ");
    (tokens.join(","), remainder.trim().to_string())
}
