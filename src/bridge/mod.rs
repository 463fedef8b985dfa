// src/bridge/mod.rs

//! 导入流程与宿主环境之间的接口：用户交互、结果持久化与进度通知。

pub mod console;

pub use console::ConsoleBridge;

use crate::{
    constants::output,
    error::AppResult,
    models::{
        CanonicalCourseRecord, ImportSummary,
        api::{CourseConfig, TimeSlot},
    },
};
use async_trait::async_trait;

/// 交给宿主保存的一份数据
#[derive(Debug, Clone, Copy)]
pub enum PersistPayload<'a> {
    Courses(&'a [CanonicalCourseRecord]),
    TimeSlots(&'a [TimeSlot]),
    Config(&'a CourseConfig),
}

impl PersistPayload<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            PersistPayload::Courses(_) => "课程",
            PersistPayload::TimeSlots(_) => "时间段",
            PersistPayload::Config(_) => "课表配置",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            PersistPayload::Courses(_) => output::COURSES_FILE,
            PersistPayload::TimeSlots(_) => output::TIME_SLOTS_FILE,
            PersistPayload::Config(_) => output::COURSE_CONFIG_FILE,
        }
    }

    pub fn to_json(&self) -> AppResult<String> {
        let json = match self {
            PersistPayload::Courses(courses) => serde_json::to_string_pretty(courses)?,
            PersistPayload::TimeSlots(slots) => serde_json::to_string_pretty(slots)?,
            PersistPayload::Config(config) => serde_json::to_string_pretty(config)?,
        };
        Ok(json)
    }
}

/// 宿主环境提供的能力。
///
/// 流程中的每一步都会等待宿主的回应后再继续；
/// `persist` 返回 `false` 表示宿主拒绝保存，此时流程中止。
#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn ask_confirmation(&self, title: &str, message: &str) -> AppResult<bool>;

    /// 返回所选项的下标，`None` 表示用户取消
    async fn ask_selection(
        &self,
        title: &str,
        options: &[String],
        default_index: usize,
    ) -> AppResult<Option<usize>>;

    async fn persist(&self, payload: PersistPayload<'_>) -> AppResult<bool>;

    fn notify(&self, message: &str);

    fn notify_done(&self, summary: &ImportSummary);
}
