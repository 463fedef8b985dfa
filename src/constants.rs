// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const COURSE_NAME_TRUNCATE_LENGTH: usize = 28;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const DEFAULT_OUTPUT_DIR: &str = "timetable";
pub const COOKIE_ENV_VAR: &str = "PORTAL_COOKIE";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

// 字段缺失时使用的占位值
pub const UNKNOWN_COURSE: &str = "未知课程";
pub const UNKNOWN_TEACHER: &str = "未知教师";
pub const UNKNOWN_POSITION: &str = "未知地点";

// 超出范围的周次、节次视为格式错误
pub const MAX_WEEK: u32 = 60;
pub const MAX_PERIOD: u32 = 30;

pub mod output {
    pub const COURSES_FILE: &str = "courses.json";
    pub const TIME_SLOTS_FILE: &str = "time_slots.json";
    pub const COURSE_CONFIG_FILE: &str = "course_config.json";
}

pub mod schools {
    pub const GZST: &str = "gzst";
    pub const NEU: &str = "neu";
    pub const XMCU: &str = "xmcu";
}
