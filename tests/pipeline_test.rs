// tests/pipeline_test.rs

use async_trait::async_trait;
use mockito::Matcher;
use serde_json::Value;
use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use timetable_import::{
    ImportJobContext,
    bridge::{HostBridge, PersistPayload},
    client::RobustClient,
    config::AppConfig,
    error::{AppError, AppResult},
    models::ImportSummary,
    workflows::{ImportOptions, ImportOutcome, run_import},
};

// --- 可编排应答的宿主替身 ---

struct ScriptedBridge {
    confirm: bool,
    selections: Mutex<VecDeque<Option<usize>>>,
    accept_persist: bool,
    persisted: Mutex<Vec<(String, Value)>>,
    selection_titles: Mutex<Vec<String>>,
    done: Mutex<Option<ImportSummary>>,
}

impl ScriptedBridge {
    fn new(confirm: bool, selections: &[Option<usize>], accept_persist: bool) -> Self {
        Self {
            confirm,
            selections: Mutex::new(selections.iter().copied().collect()),
            accept_persist,
            persisted: Mutex::new(Vec::new()),
            selection_titles: Mutex::new(Vec::new()),
            done: Mutex::new(None),
        }
    }

    fn accepting() -> Self {
        Self::new(true, &[], true)
    }

    fn persisted(&self) -> Vec<(String, Value)> {
        self.persisted.lock().unwrap().clone()
    }

    fn persisted_payload(&self, label: &str) -> Option<Value> {
        self.persisted()
            .into_iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }
}

#[async_trait]
impl HostBridge for ScriptedBridge {
    async fn ask_confirmation(&self, _title: &str, _message: &str) -> AppResult<bool> {
        Ok(self.confirm)
    }

    async fn ask_selection(
        &self,
        title: &str,
        _options: &[String],
        _default_index: usize,
    ) -> AppResult<Option<usize>> {
        self.selection_titles.lock().unwrap().push(title.to_string());
        Ok(self.selections.lock().unwrap().pop_front().flatten())
    }

    async fn persist(&self, payload: PersistPayload<'_>) -> AppResult<bool> {
        let value: Value = serde_json::from_str(&payload.to_json()?)?;
        self.persisted
            .lock()
            .unwrap()
            .push((payload.label().to_string(), value));
        Ok(self.accept_persist)
    }

    fn notify(&self, _message: &str) {}

    fn notify_done(&self, summary: &ImportSummary) {
        *self.done.lock().unwrap() = Some(summary.clone());
    }
}

// --- 辅助函数 ---

const COOKIE: &str = "JSESSIONID=abc123";

fn context(config: AppConfig) -> ImportJobContext {
    let client = RobustClient::new(&config, Some(COOKIE.to_string())).expect("Failed to create client");
    ImportJobContext {
        config: Arc::new(config),
        http_client: Arc::new(client),
        cancellation_token: Arc::new(AtomicBool::new(false)),
    }
}

fn config_with_urls(school: &str, document_url: String) -> AppConfig {
    let mut config = AppConfig::default();
    config.max_retries = 0;
    config
        .schools
        .get_mut(school)
        .expect("built-in profile")
        .document_url = Some(document_url);
    config
}

fn options(school: &str) -> ImportOptions {
    ImportOptions {
        school_key: school.to_string(),
        ..Default::default()
    }
}

fn kb_block(name: &str, section: &str) -> String {
    format!(
        r#"{name}<br><font title="老师">王老师</font><br><font title="周次(节次)">1-16(周)[{section}节]</font><br><font title="教室">A101</font><br>"#
    )
}

fn kbtable_page(rows: &[&str]) -> String {
    let rows: String = rows
        .iter()
        .enumerate()
        .map(|(i, content)| {
            format!(
                r#"<tr><th>第{}大节</th><td><div class="kbcontent1"></div><div class="kbcontent" style="display: none;">{}</div></td></tr>"#,
                i + 1,
                content
            )
        })
        .collect();
    format!(
        r#"<html><body><table id="kbtable"><tr><th></th><th>星期一</th></tr>{}</table></body></html>"#,
        rows
    )
}

// --- 在线导入 (kbtable) ---

#[tokio::test]
async fn test_online_import_merges_adjacent_blocks_and_persists_all_payloads() {
    let mut server = mockito::Server::new_async().await;
    let page = kbtable_page(&[&kb_block("高等数学", "01-02"), &kb_block("高等数学", "03-04")]);
    let mock = server
        .mock("GET", "/kb")
        .match_header("cookie", COOKIE)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(page)
        .create_async()
        .await;

    let context = context(config_with_urls("gzst", format!("{}/kb", server.url())));
    let bridge = ScriptedBridge::accepting();

    let outcome = run_import(&context, &bridge, &options("gzst")).await.unwrap();
    mock.assert_async().await;

    let ImportOutcome::Completed(summary) = outcome else {
        panic!("expected completed import, got {:?}", outcome);
    };
    assert_eq!(summary.raw_count, 2);
    assert_eq!(summary.canonical_count, 1);
    assert_eq!(bridge.done.lock().unwrap().as_ref(), Some(&summary));

    let labels: Vec<String> = bridge.persisted().into_iter().map(|(l, _)| l).collect();
    assert_eq!(labels, vec!["课程", "时间段", "课表配置"]);

    let courses = bridge.persisted_payload("课程").unwrap();
    assert_eq!(
        courses,
        serde_json::json!([{
            "name": "高等数学",
            "teacher": "王老师",
            "position": "A101",
            "day": 1,
            "startSection": 1,
            "endSection": 4,
            "weeks": (1..=16).collect::<Vec<u32>>()
        }])
    );
    assert_eq!(bridge.persisted_payload("时间段").unwrap().as_array().unwrap().len(), 12);
    assert_eq!(
        bridge.persisted_payload("课表配置").unwrap(),
        serde_json::json!({ "semesterTotalWeeks": 20 })
    );
}

#[tokio::test]
async fn test_declined_confirmation_cancels_before_any_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/kb").expect(0).create_async().await;

    let context = context(config_with_urls("gzst", format!("{}/kb", server.url())));
    let bridge = ScriptedBridge::new(false, &[], true);

    let outcome = run_import(&context, &bridge, &options("gzst")).await.unwrap();
    assert_eq!(outcome, ImportOutcome::Cancelled);
    assert!(bridge.persisted().is_empty());
    assert!(bridge.done.lock().unwrap().is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejected_persistence_aborts_remaining_stages() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/kb")
        .with_body(kbtable_page(&[&kb_block("大学英语", "01-02")]))
        .create_async()
        .await;

    let context = context(config_with_urls("gzst", format!("{}/kb", server.url())));
    let bridge = ScriptedBridge::new(true, &[], false);

    let result = run_import(&context, &bridge, &options("gzst")).await;
    assert!(matches!(result, Err(AppError::PersistRejected(ref what)) if what == "课程"));
    assert_eq!(bridge.persisted().len(), 1);
    assert!(bridge.done.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_page_without_table_is_reported_as_structural_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/kb")
        .with_body("<html><body><form id=\"login\"></form></body></html>")
        .create_async()
        .await;

    let context = context(config_with_urls("gzst", format!("{}/kb", server.url())));
    let bridge = ScriptedBridge::accepting();

    let result = run_import(&context, &bridge, &options("gzst")).await;
    assert!(matches!(result, Err(AppError::TableNotFound { .. })));
    assert!(bridge.persisted().is_empty());
}

#[tokio::test]
async fn test_empty_table_yields_no_courses() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/kb")
        .with_body(kbtable_page(&["&nbsp;"]))
        .create_async()
        .await;

    let context = context(config_with_urls("gzst", format!("{}/kb", server.url())));
    let bridge = ScriptedBridge::accepting();

    let result = run_import(&context, &bridge, &options("gzst")).await;
    assert!(matches!(result, Err(AppError::NoCourses)));
    assert!(bridge.persisted().is_empty());
}

#[tokio::test]
async fn test_expired_session_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/kb")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let context = context(config_with_urls("gzst", format!("{}/kb", server.url())));
    let bridge = ScriptedBridge::accepting();

    let result = run_import(&context, &bridge, &options("gzst")).await;
    assert!(matches!(result, Err(AppError::SessionExpired { status: 401 })));
    mock.assert_async().await;
}

// --- 学期选择 (matrix table) ---

fn xmcu_config(server_url: &str) -> AppConfig {
    let mut config = config_with_urls("xmcu", format!("{}/kb?params={{params}}", server_url));
    config
        .schools
        .get_mut("xmcu")
        .unwrap()
        .semester_list
        .as_mut()
        .unwrap()
        .url = format!("{}/droplist", server_url);
    config
}

fn matrix_block(lines: &[&str]) -> String {
    format!(r#"<div style="padding-bottom:5px;">{}</div>"#, lines.join("<br>"))
}

#[tokio::test]
async fn test_semester_selection_builds_encoded_params() {
    let mut server = mockito::Server::new_async().await;
    let droplist = server
        .mock("POST", "/droplist")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::Regex("comboBoxName=StMsXnxqDxDesc".into()))
        .with_header("content-type", "application/json")
        .with_body(r#"[{"name":"2024-2025学年第一学期","code":"2024-1"},{"name":"2024-2025学年第二学期","code":"2024-2"}]"#)
        .create_async()
        .await;

    let page = format!(
        r#"<table id="mytable"><tr><td class="td">{}{}</td></tr></table>"#,
        matrix_block(&["软件工程", "陈老师", "1-4[1-2]", "实训楼301"]),
        matrix_block(&["软件工程", "陈老师", "1-2[3-4]", "实训楼301"]),
    );
    let timetable = server
        .mock("GET", "/kb")
        .match_query(Matcher::UrlEncoded("params".into(), "eG49MjAyNCZ4cT0y".into()))
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(page)
        .create_async()
        .await;

    let context = context(xmcu_config(&server.url()));
    let bridge = ScriptedBridge::new(true, &[Some(1)], true);

    let outcome = run_import(&context, &bridge, &options("xmcu")).await.unwrap();
    droplist.assert_async().await;
    timetable.assert_async().await;

    assert_eq!(*bridge.selection_titles.lock().unwrap(), vec!["选择导入学期"]);
    let ImportOutcome::Completed(summary) = outcome else {
        panic!("expected completed import");
    };
    assert_eq!(summary.raw_count, 2);
    assert_eq!(summary.canonical_count, 2);

    let courses = bridge.persisted_payload("课程").unwrap();
    let spans: Vec<(u64, u64, Value)> = courses
        .as_array()
        .unwrap()
        .iter()
        .map(|c| {
            (
                c["startSection"].as_u64().unwrap(),
                c["endSection"].as_u64().unwrap(),
                c["weeks"].clone(),
            )
        })
        .collect();
    assert_eq!(
        spans,
        vec![
            (1, 2, serde_json::json!([3, 4])),
            (1, 4, serde_json::json!([1, 2])),
        ]
    );
    // 没有需要保存的课表配置
    assert!(bridge.persisted_payload("课表配置").is_none());
}

#[tokio::test]
async fn test_cancelled_semester_selection_skips_timetable_request() {
    let mut server = mockito::Server::new_async().await;
    let _droplist = server
        .mock("POST", "/droplist")
        .with_body(r#"[{"name":"2024-2025学年第一学期","code":"2024-1"}]"#)
        .create_async()
        .await;
    let timetable = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let context = context(xmcu_config(&server.url()));
    let bridge = ScriptedBridge::new(true, &[None], true);

    let outcome = run_import(&context, &bridge, &options("xmcu")).await.unwrap();
    assert_eq!(outcome, ImportOutcome::Cancelled);
    assert!(bridge.persisted().is_empty());
    timetable.assert_async().await;
}

#[tokio::test]
async fn test_malformed_semester_list_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _droplist = server
        .mock("POST", "/droplist")
        .with_body("<html>请先登录</html>")
        .create_async()
        .await;

    let context = context(xmcu_config(&server.url()));
    let bridge = ScriptedBridge::accepting();

    let result = run_import(&context, &bridge, &options("xmcu")).await;
    assert!(matches!(result, Err(AppError::ApiParseFailed { .. })));
}

// --- 本地文件导入 (day columns) ---

fn neu_page(term_label: &str) -> String {
    let slot = |flex: u32, name: &str, detail: &str| {
        format!(
            r#"<div class="kbappTimetableDayColumnConflictContainer" style="flex: {flex} 1 0%;"><div class="kbappTimetableCourseRenderCourseItem"><span class="kbappTimetableCourseRenderCourseItemInfoText">{name}</span><span class="kbappTimetableCourseRenderCourseItemInfoText">{detail}</span></div></div>"#
        )
    };
    let empty = |flex: u32| format!(r#"<div class="kbappTimetableDayColumnEmpty" style="flex: {flex} 1 0%;"></div>"#);
    let column = |content: String| format!(r#"<div class="kbappTimetableDayColumnRoot">{content}</div>"#);
    format!(
        r#"<html><body><div class="kbappTimeXQText">{}</div>{}{}</body></html>"#,
        term_label,
        column(empty(12)),
        column(format!("{}{}", empty(2), slot(2, "数据结构", "1-16周 刘老师 浑南 B301"))),
    )
}

fn write_page(dir: &tempfile::TempDir, html: &str) -> PathBuf {
    let path = dir.path().join("timetable.html");
    std::fs::write(&path, html).unwrap();
    path
}

#[tokio::test]
async fn test_file_import_with_campus_selection_and_derived_start_date() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_page(&dir, &neu_page("2024-2025学年春季学期"));

    let context = context(AppConfig::default());
    let bridge = ScriptedBridge::new(true, &[Some(1)], true);
    let options = ImportOptions {
        file: Some(path),
        ..options("neu")
    };

    let outcome = run_import(&context, &bridge, &options).await.unwrap();
    assert!(matches!(outcome, ImportOutcome::Completed(_)));
    assert_eq!(*bridge.selection_titles.lock().unwrap(), vec!["请选择校区"]);

    let courses = bridge.persisted_payload("课程").unwrap();
    assert_eq!(courses[0]["day"], 1);
    assert_eq!(courses[0]["startSection"], 3);
    assert_eq!(courses[0]["endSection"], 4);
    assert_eq!(courses[0]["teacher"], "刘老师");
    assert_eq!(courses[0]["position"], "浑南 B301");

    // 第二个校区 (南湖) 的作息时间
    let slots = bridge.persisted_payload("时间段").unwrap();
    assert_eq!(slots[0]["startTime"], "08:00");

    let config = bridge.persisted_payload("课表配置").unwrap();
    assert_eq!(config["semesterStartDate"], "2025-03-01");
    assert_eq!(config["firstDayOfWeek"], 7);
}

#[tokio::test]
async fn test_preset_campus_skips_prompt_and_unknown_campus_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_page(&dir, &neu_page("2024-2025学年秋季学期"));
    let context = context(AppConfig::default());

    let bridge = ScriptedBridge::accepting();
    let preset = ImportOptions {
        file: Some(path.clone()),
        campus: Some("浑南校区".into()),
        ..options("neu")
    };
    run_import(&context, &bridge, &preset).await.unwrap();
    assert!(bridge.selection_titles.lock().unwrap().is_empty());
    assert_eq!(bridge.persisted_payload("时间段").unwrap()[0]["startTime"], "08:30");

    let bridge = ScriptedBridge::accepting();
    let unknown = ImportOptions {
        file: Some(path),
        campus: Some("不存在的校区".into()),
        ..options("neu")
    };
    let result = run_import(&context, &bridge, &unknown).await;
    assert!(matches!(result, Err(AppError::UserInputError(_))));
    assert!(bridge.persisted().is_empty());
}

#[tokio::test]
async fn test_bad_term_label_fails_before_any_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_page(&dir, &neu_page("2024-2026学年秋季学期"));
    let context = context(AppConfig::default());
    let bridge = ScriptedBridge::new(true, &[Some(0)], true);
    let options = ImportOptions {
        file: Some(path),
        ..options("neu")
    };

    let result = run_import(&context, &bridge, &options).await;
    assert!(matches!(result, Err(AppError::SemesterFormat(_))));
    assert!(bridge.persisted().is_empty());
}

#[tokio::test]
async fn test_school_without_url_requires_file() {
    let context = context(AppConfig::default());
    let bridge = ScriptedBridge::new(true, &[Some(0)], true);
    let result = run_import(&context, &bridge, &options("neu")).await;
    assert!(matches!(result, Err(AppError::UserInputError(_))));
}

#[tokio::test]
async fn test_unknown_school_and_interrupt() {
    let context = context(AppConfig::default());
    let bridge = ScriptedBridge::accepting();
    assert!(matches!(
        run_import(&context, &bridge, &options("nowhere")).await,
        Err(AppError::UnknownSchool(_))
    ));

    context.cancellation_token.store(true, Ordering::Relaxed);
    let result = run_import(&context, &bridge, &options("gzst")).await;
    assert!(matches!(result, Err(AppError::UserInterrupt)));
    assert!(bridge.persisted().is_empty());
}
