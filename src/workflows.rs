// src/workflows.rs

//! 导入流程：确认 -> 选择校区 -> 选择学期 -> 获取页面 -> 提取 -> 合并 -> 保存。
//!
//! 每一步都等待上一步完成后才开始。用户拒绝或取消选择时流程在任何保存动作之前结束，
//! 不会留下部分结果；获取失败或宿主拒绝保存则以错误结束，不做重试。

use crate::{
    ImportJobContext,
    bridge::{HostBridge, PersistPayload},
    canonical::canonicalize_with,
    config::{SchoolProfile, SemesterListConfig},
    error::*,
    extractor::build_extractor,
    models::{
        ImportSummary,
        api::{CourseConfig, SemesterOption, TimeSlot},
    },
    ui, utils,
};
use anyhow::Context;
use log::{debug, error, info, warn};
use std::{path::PathBuf, sync::atomic::Ordering};
use url::Url;

const PARAMS_PLACEHOLDER: &str = "{params}";

/// 单次导入的输入参数
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub school_key: String,
    /// 使用本地保存的页面，跳过学期选择与网络请求
    pub file: Option<PathBuf>,
    pub url_override: Option<String>,
    /// 预先指定的校区名称
    pub campus: Option<String>,
    /// 预先指定的学期序号，从 1 开始
    pub semester: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Completed(ImportSummary),
    /// 用户在某一步拒绝或取消，未保存任何数据
    Cancelled,
}

fn check_cancelled(context: &ImportJobContext) -> AppResult<()> {
    if context.cancellation_token.load(Ordering::Relaxed) {
        return Err(AppError::UserInterrupt);
    }
    Ok(())
}

pub async fn run_import(
    context: &ImportJobContext,
    bridge: &dyn HostBridge,
    options: &ImportOptions,
) -> AppResult<ImportOutcome> {
    let profile = context
        .config
        .school(&options.school_key)
        .ok_or_else(|| AppError::UnknownSchool(options.school_key.clone()))?;
    info!("开始导入 '{}' ({})", profile.display_name, options.school_key);

    if let Some(message) = &profile.confirm_message
        && !bridge.ask_confirmation(&profile.display_name, message).await?
    {
        info!("用户取消了导入");
        return Ok(ImportOutcome::Cancelled);
    }
    check_cancelled(context)?;

    let Some(time_slots) = select_time_slots(profile, bridge, options.campus.as_deref()).await? else {
        info!("用户未选择校区");
        return Ok(ImportOutcome::Cancelled);
    };
    check_cancelled(context)?;

    let Some(document) = load_document(context, profile, bridge, options).await? else {
        info!("用户未选择学期");
        return Ok(ImportOutcome::Cancelled);
    };
    check_cancelled(context)?;

    bridge.notify("正在解析课表...");
    let extracted = build_extractor(profile).extract(&document)?;
    let raw_count = extracted.records.len();
    if raw_count == 0 {
        return Err(AppError::NoCourses);
    }
    let courses = canonicalize_with(profile.merge_strategy, profile.grouping_key, extracted.records);
    if courses.is_empty() {
        return Err(AppError::NoCourses);
    }
    bridge.notify(&format!(
        "解析到 {} 条课程记录，合并后共 {} 门课程",
        raw_count,
        courses.len()
    ));

    // 在保存任何数据之前算好课表配置，学期文本有误时不会留下一半的导入结果
    let course_config = build_course_config(profile, extracted.term_label.as_deref())?;
    check_cancelled(context)?;

    persist_or_abort(bridge, PersistPayload::Courses(&courses)).await?;
    if time_slots.is_empty() {
        warn!("'{}' 未配置作息时间，跳过时间段导入", options.school_key);
    } else {
        persist_or_abort(bridge, PersistPayload::TimeSlots(&time_slots)).await?;
    }
    if !course_config.is_empty() {
        persist_or_abort(bridge, PersistPayload::Config(&course_config)).await?;
    }

    let summary = ImportSummary {
        school: profile.display_name.clone(),
        raw_count,
        canonical_count: courses.len(),
    };
    bridge.notify_done(&summary);
    info!("导入完成: {:?}", summary);
    Ok(ImportOutcome::Completed(summary))
}

async fn persist_or_abort(bridge: &dyn HostBridge, payload: PersistPayload<'_>) -> AppResult<()> {
    let label = payload.label();
    match bridge.persist(payload).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            error!("宿主拒绝保存{}数据", label);
            Err(AppError::PersistRejected(label.to_string()))
        }
        Err(e) => {
            error!("保存{}数据失败: {}", label, e);
            Err(e)
        }
    }
}

/// 选择作息时间表。有多个校区时需要用户选择，返回 `None` 表示取消。
async fn select_time_slots(
    profile: &SchoolProfile,
    bridge: &dyn HostBridge,
    preset: Option<&str>,
) -> AppResult<Option<Vec<TimeSlot>>> {
    let campuses = match profile.campuses.as_slice() {
        [] => return Ok(Some(profile.time_slots.clone())),
        [only] => return Ok(Some(only.time_slots.clone())),
        campuses => campuses,
    };

    if let Some(name) = preset {
        let campus = campuses.iter().find(|c| c.name == name).ok_or_else(|| {
            let available: Vec<&str> = campuses.iter().map(|c| c.name.as_str()).collect();
            AppError::UserInputError(format!("未知的校区 '{}'，可选: {}", name, available.join(", ")))
        })?;
        debug!("使用预设校区 '{}'", campus.name);
        return Ok(Some(campus.time_slots.clone()));
    }

    let names: Vec<String> = campuses.iter().map(|c| c.name.clone()).collect();
    let selected = bridge.ask_selection("请选择校区", &names, 0).await?;
    Ok(selected.and_then(|i| campuses.get(i)).map(|campus| {
        info!("已选择校区 '{}'", campus.name);
        campus.time_slots.clone()
    }))
}

/// 获取课表页面。需要选择学期而用户取消时返回 `None`。
async fn load_document(
    context: &ImportJobContext,
    profile: &SchoolProfile,
    bridge: &dyn HostBridge,
    options: &ImportOptions,
) -> AppResult<Option<String>> {
    if let Some(path) = &options.file {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("读取课表页面 '{}' 失败", path.display()))?;
        bridge.notify(&format!("已读取本地课表页面 '{}'", path.display()));
        return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
    }

    let template = options
        .url_override
        .as_deref()
        .or(profile.document_url.as_deref())
        .ok_or_else(|| {
            AppError::UserInputError(format!(
                "'{}' 的课表需要登录后在浏览器中查看，请保存页面后使用 --file 导入",
                profile.display_name
            ))
        })?;

    let url = match &profile.semester_list {
        Some(semester_list) if template.contains(PARAMS_PLACEHOLDER) => {
            let Some(params) = select_semester(context, semester_list, bridge, options.semester).await?
            else {
                return Ok(None);
            };
            check_cancelled(context)?;
            template.replace(PARAMS_PLACEHOLDER, &params)
        }
        _ => template.to_string(),
    };
    let url = Url::parse(&url)?;

    let spinner = ui::new_spinner("正在获取课表页面...");
    let result = context
        .http_client
        .fetch_text(url.as_str(), profile.encoding.as_deref())
        .await;
    spinner.finish_and_clear();
    result.map(Some)
}

/// 获取学期列表并选择一个学期，返回编码后的学期参数
async fn select_semester(
    context: &ImportJobContext,
    semester_list: &SemesterListConfig,
    bridge: &dyn HostBridge,
    preset: Option<usize>,
) -> AppResult<Option<String>> {
    bridge.notify("正在获取学期列表...");
    let semesters: Vec<SemesterOption> = context
        .http_client
        .post_form_json(&semester_list.url, &semester_list.form)
        .await?;
    if semesters.is_empty() {
        return Err(AppError::UserInputError("教务系统返回的学期列表为空".to_string()));
    }

    let index = match preset {
        Some(n) if (1..=semesters.len()).contains(&n) => n - 1,
        Some(n) => {
            return Err(AppError::UserInputError(format!(
                "学期序号 {} 超出范围 (1-{})",
                n,
                semesters.len()
            )));
        }
        None => {
            let names: Vec<String> = semesters.iter().map(|s| s.name.clone()).collect();
            match bridge.ask_selection("选择导入学期", &names, 0).await? {
                Some(i) if i < semesters.len() => i,
                _ => return Ok(None),
            }
        }
    };

    let semester = &semesters[index];
    let (xn, xq) = semester
        .split_code()
        .ok_or_else(|| AppError::SemesterFormat(format!("学期代码 '{}' 无法拆分为学年与学期", semester.code)))?;
    info!("已选择学期 '{}' (xn={}, xq={})", semester.name, xn, xq);
    Ok(Some(utils::encode_term_params(xn, xq)))
}

/// 以学校配置为模板生成课表配置；需要时由页面上的学期文本推算开学日期
fn build_course_config(profile: &SchoolProfile, term_label: Option<&str>) -> AppResult<CourseConfig> {
    let mut config = profile.course_config.clone();
    if profile.derive_start_date {
        match term_label {
            Some(label) => {
                let start_date = utils::parse_semester_start_date(label)?;
                debug!("由学期文本 '{}' 推算开学日期 {}", label, start_date);
                config.semester_start_date = Some(start_date);
            }
            None => warn!("页面中未找到学期信息，无法推算开学日期"),
        }
    }
    Ok(config)
}
