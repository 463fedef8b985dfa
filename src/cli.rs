// src/cli.rs

use crate::constants;
use clap::{Parser, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// 从高校教务系统导出课表，去重合并后保存为可导入的 JSON 文件
#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .args(&["school", "list_schools"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 按学校配置导入课表 (使用 --list-schools 查看可用的配置)
    #[arg(short, long, value_name = "KEY", help_heading = "Mode")]
    pub school: Option<String>,
    /// 列出所有可用的学校配置并退出
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub list_schools: bool,

    // --- 导入选项 (Options) ---
    /// 从本地保存的课表页面 (HTML) 导入，而不是联网获取
    #[arg(short, long, value_name = "HTML", help_heading = "Options")]
    pub file: Option<PathBuf>,
    /// 覆盖学校配置中的课表页面地址
    #[arg(long, help_heading = "Options", conflicts_with = "file")]
    pub url: Option<String>,
    /// 提供教务系统的登录 Cookie，优先级最高
    #[arg(long, help_heading = "Options")]
    pub cookie: Option<String>,
    /// 以隐藏输入的方式手动输入 Cookie
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options", conflicts_with = "cookie")]
    pub ask_cookie: bool,
    /// 将本次使用的 Cookie 保存到配置文件
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub save_cookie: bool,
    /// 预先指定校区名称 (用于有多个校区作息时间的学校)
    #[arg(long, value_name = "NAME", help_heading = "Options")]
    pub campus: Option<String>,
    /// 预先指定学期序号 (从 1 开始，对应学期列表中的顺序)
    #[arg(long, value_name = "INDEX", value_parser = clap::value_parser!(usize), help_heading = "Options")]
    pub semester: Option<usize>,
    /// 非交互模式：自动确认所有提示并使用默认选项
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub yes: bool,
    /// 设置导出文件的保存目录
    #[arg(short, long, value_name = "DIR", default_value_os_t = PathBuf::from(constants::DEFAULT_OUTPUT_DIR), help_heading = "Options")]
    pub output: PathBuf,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}
