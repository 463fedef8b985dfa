// src/client.rs

use crate::{config::AppConfig, error::*};
use log::{debug, warn};
use reqwest::{
    IntoUrl, Response, StatusCode,
    header::{CONTENT_TYPE, COOKIE},
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;

/// 带重试的 HTTP 客户端，所有请求自动附带教务系统的登录 Cookie (如有)
#[derive(Clone)]
pub struct RobustClient {
    client: ClientWithMiddleware,
    cookie: Option<String>,
}

impl RobustClient {
    pub fn new(config: &AppConfig, cookie: Option<String>) -> AppResult<Self> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(
            reqwest::Client::builder()
                .user_agent(config.user_agent.clone())
                .connect_timeout(config.connect_timeout)
                .timeout(config.timeout)
                .build()?,
        )
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

        Ok(Self { client, cookie })
    }

    fn with_cookie(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie.as_str()),
            None => builder,
        }
    }

    fn check_status(res: Response) -> AppResult<Response> {
        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("请求 '{}' 被拒绝 (HTTP {})", res.url(), status);
            return Err(AppError::SessionExpired { status: status.as_u16() });
        }
        Ok(res.error_for_status()?)
    }

    pub async fn get<T: IntoUrl>(&self, url: T) -> AppResult<Response> {
        let res = self.with_cookie(self.client.get(url)).send().await?;
        Self::check_status(res)
    }

    /// 获取页面文本。`encoding` 为响应头未声明字符集时使用的默认编码 (如 `gbk`)。
    pub async fn fetch_text(&self, url: &str, encoding: Option<&str>) -> AppResult<String> {
        debug!("GET {} (编码: {})", url, encoding.unwrap_or("utf-8"));
        let res = self.get(url).await?;
        let text = match encoding {
            Some(encoding) => res.text_with_charset(encoding).await?,
            None => res.text().await?,
        };
        debug!("收到 {} 字节的页面内容", text.len());
        Ok(text)
    }

    /// 以 `application/x-www-form-urlencoded` 提交表单，并将响应解析为 JSON
    pub async fn post_form_json<T: DeserializeOwned>(&self, url: &str, form: &str) -> AppResult<T> {
        debug!("POST {} 表单: {}", url, form);
        let builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form.to_string());
        let res = Self::check_status(self.with_cookie(builder).send().await?)?;
        let body = res.text().await?;
        serde_json::from_str(&body).map_err(|source| AppError::ApiParseFailed {
            url: url.to_string(),
            source,
        })
    }
}
