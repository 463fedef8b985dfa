// src/extractor/utils.rs

use crate::{
    config::WeekdayOrder,
    error::{AppError, AppResult},
};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// 解析 CSS 选择器，失败时给出带选择器原文的错误
pub fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|e| AppError::InvalidSelector {
        selector: css.to_string(),
        reason: format!("{:?}", e),
    })
}

/// 合并连续空白并去除首尾空白
pub fn normalize_ws(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// 元素内的全部文本
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}

/// 去掉 HTML 片段中的标签，并解码实体
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    normalize_ws(&fragment.root_element().text().collect::<String>())
}

/// 元素的各个直接子节点中的文本，每个子节点一行，空行被丢弃
pub fn child_text_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(normalize_ws(text)),
            Node::Element(_) => ElementRef::wrap(node).map(element_text),
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// 为空时使用占位值
pub fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

/// 将从 0 开始的列序号映射为星期 (1 = 周一 … 7 = 周日)，超出一周范围时返回 `None`
pub fn weekday_for_column(index: usize, order: WeekdayOrder) -> Option<u8> {
    if index > 6 {
        return None;
    }
    let day = match order {
        WeekdayOrder::MondayFirst => index + 1,
        WeekdayOrder::SundayFirst if index == 0 => 7,
        WeekdayOrder::SundayFirst => index,
    };
    Some(day as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_for_column() {
        assert_eq!(weekday_for_column(0, WeekdayOrder::MondayFirst), Some(1));
        assert_eq!(weekday_for_column(6, WeekdayOrder::MondayFirst), Some(7));
        assert_eq!(weekday_for_column(0, WeekdayOrder::SundayFirst), Some(7));
        assert_eq!(weekday_for_column(1, WeekdayOrder::SundayFirst), Some(1));
        assert_eq!(weekday_for_column(6, WeekdayOrder::SundayFirst), Some(6));
        assert_eq!(weekday_for_column(7, WeekdayOrder::MondayFirst), None);
    }

    #[test]
    fn test_strip_tags_and_placeholders() {
        assert_eq!(strip_tags("<b>高等 数学</b>&nbsp;<br>"), "高等 数学");
        assert_eq!(or_placeholder(Some("  ".into()), "未知教师"), "未知教师");
        assert_eq!(or_placeholder(None, "未知地点"), "未知地点");
        assert_eq!(or_placeholder(Some(" 王老师 ".into()), "未知教师"), "王老师");
    }

    #[test]
    fn test_child_text_lines() {
        let html = Html::parse_fragment("<div>大学英语<br>李老师<br><span>1-8,10[1-2]</span><br> </div>");
        let div = html.select(&selector("div").unwrap()).next().unwrap();
        assert_eq!(child_text_lines(div), vec!["大学英语", "李老师", "1-8,10[1-2]"]);
    }

    #[test]
    fn test_invalid_selector_reports_error() {
        assert!(matches!(selector("div[[["), Err(AppError::InvalidSelector { .. })));
    }
}
