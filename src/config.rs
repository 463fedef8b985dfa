// src/config.rs

pub mod cookie;

use self::cookie::load_or_create_external_config;
use crate::{
    cli::Cli,
    constants::{self, schools},
    error::AppResult,
    models::api::{CourseConfig, TimeSlot},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
    time::Duration,
};

/// 课表页面结构对应的提取器类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ExtractorType {
    /// `#kbtable` 表格，单元格内为隐藏的 `div.kbcontent`
    KbContent,
    /// 以 flex 宽度表示节次的按天分列布局
    DayColumn,
    /// `#mytable` 表格，课程块为若干行纯文本
    MatrixTable,
}

/// 表格列与星期的对应方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum WeekdayOrder {
    #[default]
    MondayFirst,
    SundayFirst,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum MergeStrategy {
    /// 精确去重后合并节次相邻的记录
    #[default]
    Adjacent,
    /// 按周展开节次矩阵，再按相同的节次段重新归并周次
    WeekMatrix,
    /// 只做精确去重
    Disabled,
}

/// 合并时用于判断“同一门课”的字段组合
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum GroupingKey {
    #[default]
    NameTeacherPosition,
    /// 忽略教室，适用于同一门课按周轮换教室的学校
    NameTeacher,
}

impl GroupingKey {
    pub fn includes_position(self) -> bool {
        matches!(self, GroupingKey::NameTeacherPosition)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

/// 需要先选择学期的学校：学期列表接口及其表单参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterListConfig {
    pub url: String,
    pub form: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampusProfile {
    pub name: String,
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolProfile {
    pub display_name: String,
    pub extractor: ExtractorType,
    pub table_selector: String,
    #[serde(default)]
    pub weekday_order: WeekdayOrder,
    #[serde(default)]
    pub merge_strategy: MergeStrategy,
    #[serde(default)]
    pub grouping_key: GroupingKey,
    /// 课表页面地址，`{params}` 会被替换为学期参数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester_list: Option<SemesterListConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub campuses: Vec<CampusProfile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub course_config: CourseConfig,
    /// 是否根据页面上的学期文本推算开学日期
    #[serde(default)]
    pub derive_start_date: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub cookies: HashMap<String, String>,
    pub schools: BTreeMap<String, SchoolProfile>,
}

fn slots(table: &[(&str, &str)]) -> Vec<TimeSlot> {
    table
        .iter()
        .enumerate()
        .map(|(i, (start, end))| TimeSlot::new(i as u32 + 1, start, end))
        .collect()
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        let gzst = SchoolProfile {
            display_name: "广州松田职业技术学院".into(),
            extractor: ExtractorType::KbContent,
            table_selector: "#kbtable".into(),
            weekday_order: WeekdayOrder::MondayFirst,
            merge_strategy: MergeStrategy::Adjacent,
            grouping_key: GroupingKey::NameTeacherPosition,
            document_url: Some("https://jw.educationgroup.cn/gzstzyxy_jsxsd/xskb/xskb_list.do".into()),
            encoding: None,
            semester_list: None,
            confirm_message: Some("请确保您已登录教务系统，即将获取课表数据并进行课程去重和合并。".into()),
            campuses: vec![],
            time_slots: slots(&[
                ("08:20", "09:00"), ("09:05", "09:45"), ("09:55", "10:35"), ("10:45", "11:25"),
                ("11:30", "12:10"), ("14:20", "15:00"), ("15:05", "15:45"), ("15:55", "16:35"),
                ("16:45", "17:25"), ("17:30", "18:10"), ("19:30", "20:35"), ("20:35", "21:40"),
            ]),
            course_config: CourseConfig {
                semester_total_weeks: Some(20),
                ..Default::default()
            },
            derive_start_date: false,
        };

        let neu = SchoolProfile {
            display_name: "东北大学".into(),
            extractor: ExtractorType::DayColumn,
            table_selector: ".kbappTimetableDayColumnRoot".into(),
            weekday_order: WeekdayOrder::SundayFirst,
            merge_strategy: MergeStrategy::Adjacent,
            grouping_key: GroupingKey::NameTeacherPosition,
            // 课表由前端动态渲染，需要通过 --file 导入保存下来的页面
            document_url: None,
            encoding: None,
            semester_list: None,
            confirm_message: None,
            campuses: vec![
                CampusProfile {
                    name: "浑南校区".into(),
                    time_slots: slots(&[
                        ("08:30", "09:15"), ("09:25", "10:10"), ("10:30", "11:15"), ("11:25", "12:10"),
                        ("14:00", "14:45"), ("14:55", "15:40"), ("16:00", "16:45"), ("16:55", "17:40"),
                        ("18:30", "19:15"), ("19:25", "20:10"), ("20:30", "21:15"), ("21:15", "22:10"),
                    ]),
                },
                CampusProfile {
                    name: "南湖校区".into(),
                    time_slots: slots(&[
                        ("08:00", "08:45"), ("08:55", "09:40"), ("10:00", "10:45"), ("10:55", "11:40"),
                        ("14:00", "14:45"), ("14:55", "15:40"), ("16:00", "16:45"), ("16:55", "17:40"),
                        ("18:30", "19:15"), ("19:25", "20:10"), ("20:20", "21:05"), ("21:15", "22:00"),
                    ]),
                },
            ],
            time_slots: vec![],
            course_config: CourseConfig {
                semester_start_date: None,
                semester_total_weeks: Some(18),
                default_class_duration: Some(45),
                default_break_duration: Some(10),
                first_day_of_week: Some(7),
            },
            derive_start_date: true,
        };

        let xmcu = SchoolProfile {
            display_name: "厦门城市职业学院".into(),
            extractor: ExtractorType::MatrixTable,
            table_selector: "#mytable".into(),
            weekday_order: WeekdayOrder::MondayFirst,
            merge_strategy: MergeStrategy::WeekMatrix,
            grouping_key: GroupingKey::NameTeacherPosition,
            document_url: Some(
                "https://jws-443.webvpn.xmcu.edu.cn/xmcsjw/student/wsxk.xskcb10319.jsp?params={params}".into(),
            ),
            encoding: Some("gbk".into()),
            semester_list: Some(SemesterListConfig {
                url: "https://jws-443.webvpn.xmcu.edu.cn/xmcsjw/frame/droplist/getDropLists.action".into(),
                form: "comboBoxName=StMsXnxqDxDesc&paramValue=&isYXB=0&isCDDW=0&isXQ=0&isDJKSLB=0&isZY=0".into(),
            }),
            confirm_message: Some("建议在‘课表查询’页面进行导入以确保数据最全。".into()),
            campuses: vec![],
            time_slots: slots(&[
                ("08:15", "09:00"), ("09:05", "09:50"), ("10:15", "11:00"), ("11:05", "11:50"),
                ("14:00", "14:45"), ("14:50", "15:35"), ("16:00", "16:45"), ("16:50", "17:35"),
                ("18:30", "19:15"), ("19:15", "20:00"), ("20:00", "20:45"),
            ]),
            course_config: CourseConfig::default(),
            derive_start_date: false,
        };

        Self {
            network: NetworkConfig {
                connect_timeout_secs: Some(10),
                timeout_secs: Some(30),
                max_retries: Some(2),
            },
            cookies: HashMap::new(),
            schools: BTreeMap::from([
                (schools::GZST.into(), gzst),
                (schools::NEU.into(), neu),
                (schools::XMCU.into(), xmcu),
            ]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub schools: BTreeMap<String, SchoolProfile>,
    pub cookies: HashMap<String, String>,
    pub output_dir: PathBuf,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;
        Ok(Self::from_external(external_config, args.output.clone()))
    }

    pub fn from_external(external_config: ExternalConfig, output_dir: PathBuf) -> Self {
        Self {
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(
                external_config.network.connect_timeout_secs.unwrap_or(10),
            ),
            timeout: Duration::from_secs(external_config.network.timeout_secs.unwrap_or(30)),
            max_retries: external_config.network.max_retries.unwrap_or(2),
            schools: external_config.schools,
            cookies: external_config.cookies,
            output_dir,
        }
    }

    pub fn school(&self, key: &str) -> Option<&SchoolProfile> {
        self.schools.get(key)
    }
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        let mut config = Self::from_external(
            ExternalConfig::default_app_config(),
            PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
        );
        config.user_agent = "test-agent/1.0".to_string();
        config.connect_timeout = Duration::from_secs(5);
        config.timeout = Duration::from_secs(15);
        config.max_retries = 1;
        config
    }
}
