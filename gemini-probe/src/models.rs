//! Models API surface.

use std::sync::Arc;

use gemini_probe_types::content::Content;
use gemini_probe_types::models::{
    GenerateContentRequest, ListModelsConfig, ListModelsResponse, Model,
};
use gemini_probe_types::response::GenerateContentResponse;

use crate::client::ClientInner;
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct Models {
    pub(crate) inner: Arc<ClientInner>,
}

impl Models {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// 生成内容。
    pub async fn generate_content(
        &self,
        model: impl Into<String>,
        contents: Vec<Content>,
    ) -> Result<GenerateContentResponse> {
        let model = model.into();
        if model.is_empty() {
            return Err(Error::InvalidConfig {
                message: "Model name must not be empty".into(),
            });
        }

        let url = build_model_method_url(&self.inner, &model, "generateContent");
        let body = GenerateContentRequest { contents };
        let response = self.inner.http.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json::<GenerateContentResponse>().await?)
    }

    /// 发送单条文本提示并提取回答文本。
    pub async fn generate_text(
        &self,
        model: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Result<String> {
        let response = self
            .generate_content(model, vec![Content::text(prompt.into())])
            .await?;
        response.text().ok_or_else(|| Error::Parse {
            message: "Response contained no text candidate".into(),
        })
    }

    /// 列出模型（单页）。
    pub async fn list(&self) -> Result<ListModelsResponse> {
        self.list_with_config(ListModelsConfig::default()).await
    }

    /// 列出模型（带配置）。
    pub async fn list_with_config(&self, config: ListModelsConfig) -> Result<ListModelsResponse> {
        let url = build_models_list_url(&self.inner, &config)?;
        let response = self.inner.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json::<ListModelsResponse>().await?)
    }

    /// 列出所有模型（自动翻页）。
    pub async fn all(&self) -> Result<Vec<Model>> {
        let mut config = ListModelsConfig::default();
        let mut models = Vec::new();
        loop {
            let response = self.list_with_config(config.clone()).await?;
            if let Some(items) = response.models {
                models.extend(items);
            }
            match response.next_page_token {
                Some(token) if !token.is_empty() => {
                    config.page_token = Some(token);
                }
                _ => break,
            }
        }
        Ok(models)
    }

    /// 获取单个模型信息。
    pub async fn get(&self, model: impl Into<String>) -> Result<Model> {
        let url = build_model_get_url(&self.inner, &model.into());
        let response = self.inner.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json::<Model>().await?)
    }
}

/// 非 2xx 响应转错误；优先取 JSON 错误体中的 `error.message`。
async fn error_from_response(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
                .map(ToString::to_string)
        })
        .unwrap_or(body);
    Error::ApiError { status, message }
}

fn transform_model_name(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

fn build_model_method_url(inner: &ClientInner, model: &str, method: &str) -> String {
    let model = transform_model_name(model);
    let base = &inner.api_client.base_url;
    let version = &inner.api_client.api_version;
    format!("{base}{version}/{model}:{method}")
}

fn build_model_get_url(inner: &ClientInner, model: &str) -> String {
    let model = transform_model_name(model);
    let base = &inner.api_client.base_url;
    let version = &inner.api_client.api_version;
    format!("{base}{version}/{model}")
}

fn build_models_list_url(inner: &ClientInner, config: &ListModelsConfig) -> Result<String> {
    let base = &inner.api_client.base_url;
    let version = &inner.api_client.api_version;
    let mut url =
        reqwest::Url::parse(&format!("{base}{version}/models")).map_err(|err| {
            Error::InvalidConfig {
                message: err.to_string(),
            }
        })?;
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(page_size) = config.page_size {
            pairs.append_pair("pageSize", &page_size.to_string());
        }
        if let Some(page_token) = &config.page_token {
            pairs.append_pair("pageToken", page_token);
        }
    }
    // query_pairs_mut leaves an empty query behind when nothing was appended.
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url.to_string())
}
