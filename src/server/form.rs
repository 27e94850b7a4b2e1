//! Request field extraction shared by all synthesis endpoints.
//!
//! Fields arrive as `multipart/form-data`, as a urlencoded body, or (for
//! `GET /tts`) as query parameters.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};

use super::error::ApiError;
use crate::{error::TtsError, synth::SpeechOptions};

/// An uploaded file part.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct Fields {
    values: HashMap<String, String>,
    pub file: Option<Upload>,
}

impl From<HashMap<String, String>> for Fields {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values, file: None }
    }
}

impl Fields {
    pub async fn from_request(request: Request) -> Result<Self, ApiError> {
        let multipart = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !multipart {
            let Form(values) = Form::<HashMap<String, String>>::from_request(request, &())
                .await
                .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
            return Ok(values.into());
        }

        let mut form = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        let mut fields = Self::default();
        while let Some(field) = form.next_field().await.map_err(|e| ApiError::new(e.status(), e.body_text()))? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
                    if name == "file" {
                        fields.file = Some(Upload { file_name, bytes });
                    }
                }
                None => {
                    let value = field.text().await.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
                    fields.values.insert(name, value);
                }
            }
        }
        Ok(fields)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn required(&self, name: &'static str) -> Result<&str, TtsError> {
        self.get(name).ok_or(TtsError::MissingField(name))
    }

    /// Synthesis options, defaults filled in.
    pub fn options(&self) -> Result<SpeechOptions, ApiError> {
        let mut options = SpeechOptions::default();
        if let Some(voice) = self.get("voice") {
            options.voice = voice.to_string();
        }
        if let Some(lang) = self.get("lang") {
            options.lang = lang.to_string();
        }
        if let Some(format) = self.get("format") {
            options.format = format.to_string();
        }
        if let Some(speed) = self.get("speed") {
            options.speed = speed
                .trim()
                .parse()
                .map_err(|_| ApiError::unprocessable(format!("speed must be a number, got '{speed}'")))?;
        }
        Ok(options)
    }
}
