//! OAuth2 client-credentials exchange.

use crate::error::{M2mClientError, Result};
use crate::types::{ApiRequest, Credentials, TOKEN_PATH};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};

/// `Basic <base64(username:password)>` header value.
pub fn basic_auth_value(username: &str, password: &str) -> String {
    let encoded = STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}

/// Form body for the client-credentials grant.
pub fn token_form(client_id: &str, client_secret: &str, scope: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", "client_credentials")
        .append_pair("client_id", client_id)
        .append_pair("client_secret", client_secret)
        .append_pair("scope", scope)
        .finish()
}

/// Build the token request for the given account.
///
/// The request carries its own headers, so dispatching it never touches the
/// cached bearer token.
pub fn token_request(
    username: &str,
    password: &str,
    credentials: &Credentials,
    scope: &str,
) -> Result<ApiRequest> {
    let mut headers = HeaderMap::new();
    let auth = HeaderValue::from_str(&basic_auth_value(username, password))
        .map_err(|e| M2mClientError::Config(format!("Invalid credentials: {}", e)))?;
    headers.insert(AUTHORIZATION, auth);
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    let form = token_form(&credentials.client_id, &credentials.client_secret, scope);

    Ok(ApiRequest::post(TOKEN_PATH).headers(headers).text(form))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestBody;
    use reqwest::Method;

    #[test]
    fn basic_auth_encoding() {
        assert_eq!(basic_auth_value("user", "pass"), "Basic dXNlcjpwYXNz");
        assert_eq!(basic_auth_value("", ""), "Basic Og==");
    }

    #[test]
    fn form_with_empty_scope() {
        assert_eq!(
            token_form("cid", "secret", ""),
            "grant_type=client_credentials&client_id=cid&client_secret=secret&scope="
        );
    }

    #[test]
    fn form_escapes_reserved_characters() {
        assert_eq!(
            token_form("a&b", "s=1", "read write"),
            "grant_type=client_credentials&client_id=a%26b&client_secret=s%3D1&scope=read+write"
        );
    }

    #[test]
    fn request_shape() {
        let creds = Credentials::new("user", "pass", "cid", "secret");
        let request = token_request("user", "pass", &creds, "").unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, TOKEN_PATH);

        let headers = request.headers.expect("explicit headers");
        assert_eq!(headers[AUTHORIZATION], "Basic dXNlcjpwYXNz");
        assert_eq!(headers[CONTENT_TYPE], "application/x-www-form-urlencoded");

        assert_eq!(
            request.body,
            Some(RequestBody::Text(
                "grant_type=client_credentials&client_id=cid&client_secret=secret&scope=".into()
            ))
        );
    }
}
