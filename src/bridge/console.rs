// src/bridge/console.rs

use super::{HostBridge, PersistPayload};
use crate::{
    constants,
    error::*,
    models::{CanonicalCourseRecord, ImportSummary},
    symbols, ui, utils,
};
use async_trait::async_trait;
use colored::*;
use log::{debug, info};
use std::{fs, io::Write, path::PathBuf};
use tempfile::NamedTempFile;

/// 终端宿主：通过命令行提示与用户交互，结果写入输出目录下的 JSON 文件。
///
/// 非交互模式下自动确认所有提示并选择默认项。
pub struct ConsoleBridge {
    output_dir: PathBuf,
    non_interactive: bool,
}

impl ConsoleBridge {
    pub fn new(output_dir: PathBuf, non_interactive: bool) -> Self {
        Self { output_dir, non_interactive }
    }

    /// 先写入同目录下的临时文件再原子替换，重复保存结果一致
    fn write_atomically(&self, file_name: &str, content: &str) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let target = self.output_dir.join(file_name);
        let mut temp_file = NamedTempFile::new_in(&self.output_dir)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&target)?;
        Ok(target)
    }
}

const WEEKDAY_NAMES: [&str; 7] = ["周一", "周二", "周三", "周四", "周五", "周六", "周日"];

fn print_course_preview(courses: &[CanonicalCourseRecord]) {
    ui::print_sub_header(&format!("课程预览 (共 {} 条)", courses.len()));
    for course in courses {
        let weekday = WEEKDAY_NAMES
            .get(usize::from(course.day).saturating_sub(1))
            .copied()
            .unwrap_or("?");
        println!(
            "  {} {:<10} {} | {} | {} | 周次 {}",
            weekday.cyan(),
            course.periods().to_string(),
            utils::truncate_text(&course.name, constants::COURSE_NAME_TRUNCATE_LENGTH).as_str().bold(),
            course.teacher,
            course.position,
            course.weeks
        );
    }
}

#[async_trait]
impl HostBridge for ConsoleBridge {
    async fn ask_confirmation(&self, title: &str, message: &str) -> AppResult<bool> {
        ui::box_message(title, &[message], |s| s.cyan());
        if self.non_interactive {
            debug!("非交互模式，自动确认 '{}'", title);
            return Ok(true);
        }
        Ok(ui::confirm("是否继续?", true))
    }

    async fn ask_selection(
        &self,
        title: &str,
        options: &[String],
        default_index: usize,
    ) -> AppResult<Option<usize>> {
        if options.is_empty() {
            return Ok(None);
        }
        if self.non_interactive {
            let index = default_index.min(options.len() - 1);
            ui::info(&format!("{}: 自动选择 '{}'", title, options[index]));
            return Ok(Some(index));
        }
        Ok(ui::selection_menu(options, title, default_index))
    }

    async fn persist(&self, payload: PersistPayload<'_>) -> AppResult<bool> {
        if let PersistPayload::Courses(courses) = payload {
            print_course_preview(courses);
        }
        let content = payload.to_json()?;
        let path = self.write_atomically(payload.file_name(), &content)?;
        info!("{}数据已写入 {}", payload.label(), path.display());
        ui::success(&format!("{}数据已保存至 {}", payload.label(), path.display()));
        Ok(true)
    }

    fn notify(&self, message: &str) {
        println!("{} {}", *symbols::INFO, message);
    }

    fn notify_done(&self, summary: &ImportSummary) {
        ui::print_header("导入完成");
        println!(
            "{} | {} | {}",
            format!("原始记录: {}", summary.raw_count).cyan(),
            format!("合并后课程: {}", summary.canonical_count).green(),
            format!("合并/去重: {}", summary.merged_count()).yellow(),
        );
        ui::info(&format!(
            "{} 的课表已导出至 '{}'",
            summary.school,
            self.output_dir.display()
        ));
    }
}
