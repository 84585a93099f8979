//! Request builders and wire types for the dispatch backend. All URLs are
//! assembled here so endpoint paths and query parameter names live in one
//! place.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::capabilities::{HttpError, HttpMethod, HttpRequest, ValidatedUrl};
use crate::model::ListKind;
use crate::pagination::{Cursor, FilterSet, Page};
use crate::{AppError, CoreConfig, ErrorKind, LIST_TIMEOUT, LOGIN_TIMEOUT, MUTATION_TIMEOUT};

/// Paginated envelope every list endpoint returns. `next` is an opaque
/// continuation token, absent on the last page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDto<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl<T> From<PageDto<T>> for Page<T> {
    fn from(dto: PageDto<T>) -> Self {
        Self {
            results: dto.results,
            next: dto.next.map(Cursor),
            count: dto.count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequestBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponseBody {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn list_path(list: ListKind) -> &'static str {
    match list {
        ListKind::Orders => "/api/v1/orders",
        ListKind::Operators => "/api/v1/operators",
        ListKind::Trucks => "/api/v1/trucks",
        ListKind::WorkCosts => "/api/v1/work-costs",
    }
}

fn endpoint(config: &CoreConfig, path: &str) -> Result<Url, AppError> {
    let base = Url::parse(&config.api_base).map_err(|e| {
        AppError::new(ErrorKind::InvalidState, format!("bad API base URL: {e}"))
            .with_context("api_base", config.api_base.clone())
    })?;
    base.join(path)
        .map_err(|e| AppError::new(ErrorKind::InvalidState, format!("bad endpoint path: {e}")))
}

fn authorized(request: HttpRequest, token: Option<&str>) -> Result<HttpRequest, HttpError> {
    match token {
        Some(token) => request.with_header("Authorization", format!("Bearer {token}")),
        None => Ok(request),
    }
}

fn from_http(err: HttpError) -> AppError {
    AppError::new(ErrorKind::InvalidState, err.to_string())
}

/// Builds one page fetch for a feed. Filters that are unset produce no query
/// parameter at all, so the backend's defaults apply.
pub fn list_request(
    config: &CoreConfig,
    list: ListKind,
    cursor: Option<&Cursor>,
    filters: &FilterSet,
    token: Option<&str>,
) -> Result<HttpRequest, AppError> {
    let mut url = endpoint(config, list_path(list))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("page_size", &config.clamped_page_size().to_string());
        if let Some(cursor) = cursor {
            query.append_pair("cursor", cursor.as_str());
        }
        if let Some(date) = &filters.date {
            query.append_pair("date", date);
        }
        if let Some(search) = &filters.search {
            query.append_pair("search", search);
        }
        if let Some(status) = &filters.status {
            query.append_pair("status", status);
        }
        if let Some(location) = &filters.location {
            query.append_pair("location", location);
        }
    }

    let request = HttpRequest::new(HttpMethod::Get, ValidatedUrl::from(url));
    let request = request.with_timeout(LIST_TIMEOUT).map_err(from_http)?;
    authorized(request, token).map_err(from_http)
}

pub fn login_request(
    config: &CoreConfig,
    email: &str,
    password: &str,
) -> Result<HttpRequest, AppError> {
    let url = endpoint(config, "/api/v1/token")?;
    HttpRequest::new(HttpMethod::Post, ValidatedUrl::from(url))
        .with_json(&LoginRequestBody {
            email: email.to_string(),
            password: password.to_string(),
        })
        .and_then(|r| r.with_timeout(LOGIN_TIMEOUT))
        .map_err(from_http)
}

pub fn create_request<T: Serialize>(
    config: &CoreConfig,
    list: ListKind,
    payload: &T,
    token: Option<&str>,
) -> Result<HttpRequest, AppError> {
    let url = endpoint(config, list_path(list))?;
    let request =
        HttpRequest::new(HttpMethod::Post, ValidatedUrl::from(url))
            .with_json(payload)
            .and_then(|r| r.with_timeout(MUTATION_TIMEOUT))
            .map_err(from_http)?;
    authorized(request, token).map_err(from_http)
}

pub fn delete_request(
    config: &CoreConfig,
    list: ListKind,
    id: &str,
    token: Option<&str>,
) -> Result<HttpRequest, AppError> {
    let mut url = endpoint(config, list_path(list))?;
    // push() percent-encodes, so a hostile id cannot change the path shape.
    url.path_segments_mut()
        .map_err(|()| AppError::new(ErrorKind::InvalidState, "API base cannot carry paths"))?
        .push(id);
    let request =
        HttpRequest::new(HttpMethod::Delete, ValidatedUrl::from(url))
            .with_timeout(MUTATION_TIMEOUT)
            .map_err(from_http)?;
    authorized(request, token).map_err(from_http)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::FilterKey;

    fn config() -> CoreConfig {
        CoreConfig::with_api_base("https://api.test.example")
    }

    #[test]
    fn list_request_carries_only_set_filters() {
        let mut filters = FilterSet::default();
        filters.set(FilterKey::Status, Some("FINISHED".into()));
        filters.set(FilterKey::Search, Some("gravel run".into()));

        let request = list_request(&config(), ListKind::Orders, None, &filters, None).unwrap();
        let url = request.url().as_str();

        assert!(url.starts_with("https://api.test.example/api/v1/orders?"));
        assert!(url.contains("status=FINISHED"));
        assert!(url.contains("search=gravel+run"));
        assert!(!url.contains("date="));
        assert!(!url.contains("location="));
        assert!(!url.contains("cursor="));
    }

    #[test]
    fn list_request_threads_cursor_and_token() {
        let cursor = Cursor("abc123".into());
        let request = list_request(
            &config(),
            ListKind::Trucks,
            Some(&cursor),
            &FilterSet::default(),
            Some("jwt-1"),
        )
        .unwrap();

        assert!(request.url().as_str().contains("cursor=abc123"));
        assert_eq!(request.header("authorization"), Some("Bearer jwt-1"));
    }

    #[test]
    fn page_size_is_clamped_into_the_query() {
        let cfg = CoreConfig {
            page_size: 9999,
            ..config()
        };
        let request =
            list_request(&cfg, ListKind::Operators, None, &FilterSet::default(), None).unwrap();
        assert!(request
            .url()
            .as_str()
            .contains(&format!("page_size={}", crate::MAX_PAGE_SIZE)));
    }

    #[test]
    fn delete_request_escapes_hostile_ids() {
        let request = delete_request(&config(), ListKind::Orders, "../admin", Some("t")).unwrap();
        let url = request.url().as_str();
        assert!(url.contains("/api/v1/orders/"));
        assert!(!url.contains("/admin"));
    }

    #[test]
    fn login_request_posts_json_credentials() {
        let request = login_request(&config(), "dispatch@example.com", "hunter2").unwrap();
        assert_eq!(request.header("content-type"), Some("application/json"));
        let body: LoginRequestBody = serde_json::from_slice(request.body().unwrap()).unwrap();
        assert_eq!(body.email, "dispatch@example.com");
    }

    #[test]
    fn page_dto_converts_with_and_without_continuation() {
        let dto: PageDto<String> =
            serde_json::from_str(r#"{"results": ["a"], "next": "c2", "count": 7}"#).unwrap();
        let page: Page<String> = dto.into();
        assert_eq!(page.next.as_ref().map(Cursor::as_str), Some("c2"));
        assert_eq!(page.count, Some(7));

        let dto: PageDto<String> = serde_json::from_str(r#"{"results": []}"#).unwrap();
        let page: Page<String> = dto.into();
        assert_eq!(page.next, None);
        assert_eq!(page.count, None);
    }

    #[test]
    fn bad_api_base_is_reported_not_panicked() {
        let cfg = CoreConfig {
            api_base: "not a url".into(),
            ..CoreConfig::default()
        };
        let err = list_request(&cfg, ListKind::Orders, None, &FilterSet::default(), None)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
    }
}
