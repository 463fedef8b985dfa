// src/extractor/mod.rs

pub mod day_column;
pub mod kbcontent;
pub mod matrix_table;
pub mod periods;
pub mod weeks;
mod utils;

use crate::{
    config::{ExtractorType, SchoolProfile},
    error::*,
    models::ExtractedTimetable,
};

/// 将某一种课表页面结构转换为原始课程记录。
///
/// 实现必须是纯函数：不做任何 I/O，可以被重复或并发调用。
/// 找不到课表根节点时返回 [`AppError::TableNotFound`]；
/// 单个课程块无法解析时直接跳过。
pub trait ScheduleExtractor: Send + Sync {
    fn extract(&self, document: &str) -> AppResult<ExtractedTimetable>;
}

/// 根据学校配置创建对应的提取器
pub fn build_extractor(profile: &SchoolProfile) -> Box<dyn ScheduleExtractor> {
    let table_selector = profile.table_selector.clone();
    match profile.extractor {
        ExtractorType::KbContent => Box::new(kbcontent::KbContentExtractor::new(
            table_selector,
            profile.weekday_order,
        )),
        ExtractorType::DayColumn => Box::new(day_column::DayColumnExtractor::new(
            table_selector,
            profile.weekday_order,
        )),
        ExtractorType::MatrixTable => Box::new(matrix_table::MatrixTableExtractor::new(
            table_selector,
            profile.weekday_order,
        )),
    }
}
