// src/models/api.rs

use serde::{Deserialize, Serialize};

// --- 导入目标使用的载荷 ---

/// 一个固定节次的上下课时间，如 `{"number": 1, "startTime": "08:20", "endTime": "09:00"}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub number: u32,
    pub start_time: String,
    pub end_time: String,
}

impl TimeSlot {
    pub fn new(number: u32, start_time: &str, end_time: &str) -> Self {
        Self {
            number,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        }
    }
}

/// 课表配置。只序列化有值的字段，其余字段交由导入目标使用默认值。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester_total_weeks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_class_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_break_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_day_of_week: Option<u8>,
}

impl CourseConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// --- 教务系统接口响应 ---

/// 学期下拉列表中的一项，`code` 形如 `2024-1`
#[derive(Deserialize, Debug, Clone)]
pub struct SemesterOption {
    pub name: String,
    pub code: String,
}

impl SemesterOption {
    /// 将 `code` 拆分为 (学年, 学期)
    pub fn split_code(&self) -> Option<(&str, &str)> {
        self.code
            .split_once('-')
            .filter(|(xn, xq)| !xn.is_empty() && !xq.is_empty())
    }
}
