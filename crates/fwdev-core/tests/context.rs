// crates/fwdev-core/tests/context.rs
// ============================================================================
// Module: FW Context Tests
// Description: Context synthesis, resolution chains, and script rendering.
// Purpose: Pin the shape of the object injected into served pages.
// Dependencies: fwdev-core, serde_json, uuid
// ============================================================================

//! ## Overview
//! Builds contexts from a fixed lookup snapshot and checks language,
//! currency, registry selection, and the rendered script envelope.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use fwdev_core::FwContext;
use fwdev_core::HostInfo;
use fwdev_core::RegistryConfig;
use fwdev_core::SessionIdentity;
use fwdev_core::SynthesisInputs;
use fwdev_core::UrlLookupData;
use fwdev_core::UrlLookupEnvelope;
use fwdev_core::context::parse_query;
use fwdev_core::context::split_request_url;
use fwdev_core::inject_script;
use fwdev_core::version::inject_version;
use serde_json::Value;
use serde_json::json;
use uuid::Uuid;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Lookup snapshot with two languages and per-language currency defaults.
fn lookup() -> UrlLookupData {
    let envelope: UrlLookupEnvelope = serde_json::from_value(json!({
        "result": "success",
        "data": {
            "Registry_Url__": "rurl-1",
            "Domain": "shop.example",
            "Languages": ["en-US", "ja-JP"],
            "Branch": "dev",
            "ExtraFw": {"urlid": "", "Realm": {"Name": "Shop"}},
            "Registry": {
                "en-US": {"Currency_Default": "USD", "Name": "English"},
                "ja-JP": {"Currency_Default": "JPY", "Name": "Japanese"}
            }
        }
    }))
    .unwrap();
    envelope.data.unwrap()
}

/// Fixed session identity.
fn session() -> SessionIdentity {
    SessionIdentity::from_parts(Uuid::nil(), "tok", 1_000)
}

/// Synthesizes a context for `url` with the given snapshot and registry.
fn synth(url: &str, lookup: &UrlLookupData, registry: &RegistryConfig) -> FwContext {
    let session = session();
    let host = HostInfo::default();
    FwContext::synthesize(url, SynthesisInputs {
        registry,
        lookup,
        session: &session,
        host: &host,
    })
}

// ============================================================================
// SECTION: Synthesis
// ============================================================================

/// The prefix locale wins and drives currency and registry selection.
#[test]
fn prefix_locale_selects_registry() {
    let fw = synth("/l/ja-JP/shop?x=1&x=2&y=", &lookup(), &RegistryConfig::new());
    assert_eq!(fw.locale, "ja-JP");
    assert_eq!(fw.context.l, "ja-JP");
    assert_eq!(fw.context.c, "JPY");
    assert_eq!(fw.context.b, "dev");
    assert_eq!(fw.registry.get("Name"), Some(&json!("Japanese")));
    assert_eq!(fw.prefix, "/l/ja-JP");
    assert_eq!(fw.path, "/shop");
    assert_eq!(fw.get.get("x").map(String::as_str), Some("2"));
    assert_eq!(fw.get.get("y").map(String::as_str), Some(""));
    assert_eq!(fw.url.full, "http://localhost:5173/l/ja-JP/shop?x=1&x=2&y=");
    assert_eq!(fw.url.path, "/l/ja-JP/shop");
    assert_eq!(fw.url.query.as_deref(), Some("x=1&x=2&y="));
    assert_eq!(fw.urlid.as_deref(), Some("rurl-1"));
    assert_eq!(fw.realm, json!({"Name": "Shop"}));
    assert_eq!(fw.cookies.locale, "ja-JP");
}

/// Without a prefix the first language and its currency apply.
#[test]
fn default_language_without_prefix() {
    let fw = synth("/", &lookup(), &RegistryConfig::new());
    assert_eq!(fw.locale, "en-US");
    assert_eq!(fw.context.c, "USD");
    assert_eq!(fw.prefix, "");
    assert_eq!(fw.path, "/");
    assert!(fw.url.query.is_none());
    assert!(fw.get.is_empty());
}

/// Currency falls back from prefix to registry default to Currency_List to USD.
#[test]
fn currency_resolution_chain() {
    let mut data = lookup();
    let explicit = synth("/c/EUR/", &data, &RegistryConfig::new());
    assert_eq!(explicit.context.c, "EUR");

    data.registry.clear();
    let registry = RegistryConfig::parse("Currency_List=CAD\n");
    assert_eq!(synth("/", &data, &registry).context.c, "CAD");
    assert_eq!(synth("/", &data, &RegistryConfig::new()).context.c, "USD");
}

/// Sparse snapshots still produce a complete object.
#[test]
fn sparse_snapshot_defaults() {
    let fw = synth("/about", &UrlLookupData::default(), &RegistryConfig::new());
    assert_eq!(fw.locale, "en-US");
    assert_eq!(fw.context.b, "master");
    assert_eq!(fw.realm, json!({}));
    assert!(fw.registry.is_empty());
    assert!(fw.urlid.is_none());
    assert_eq!(fw.mode, "client");
    assert_eq!(fw.ssr_diag, "nossr");
}

/// Null lists and empty-array maps decode as empty and still synthesize.
#[test]
fn loose_snapshot_fields_decode_as_defaults() {
    let null_languages: UrlLookupEnvelope =
        serde_json::from_str(r#"{"data":{"Languages":null,"Registry":{},"ExtraFw":null}}"#)
            .unwrap();
    let data = null_languages.data.unwrap();
    assert_eq!(data.languages(), vec!["en-US".to_string()]);
    assert_eq!(data.extra_fw, fwdev_core::context::ExtraFw::default());

    let array_registry: UrlLookupEnvelope =
        serde_json::from_str(r#"{"data":{"Languages":["en-US"],"Registry":[],"ExtraFw":[]}}"#)
            .unwrap();
    let data = array_registry.data.unwrap();
    assert!(data.registry.is_empty());
    assert!(data.currency_default("en-US").is_none());

    let fw = synth("/l/en-US/cart", &data, &RegistryConfig::new());
    assert_eq!(fw.locale, "en-US");
    assert_eq!(fw.context.c, "USD");
}

/// Non-empty values of the wrong shape are still rejected.
#[test]
fn mistyped_snapshot_fields_are_rejected() {
    let result =
        serde_json::from_str::<UrlLookupEnvelope>(r#"{"data":{"Registry":["en-US"]}}"#);
    assert!(result.is_err());
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// The rendered script wraps the JSON and carries the documented keys.
#[test]
fn rendered_script_shape() {
    let fw = synth("/l/en-US/?q=%3C%2Fscript%3E", &lookup(), &RegistryConfig::new());
    let script = fw.render_script().unwrap();
    assert!(script.starts_with("<script type=\"text/javascript\">\nvar FW = (function() {\n    var my = {"));
    assert!(script.ends_with("    return my;\n}());\n</script>\n"));
    assert_eq!(script.matches("</script>").count(), 1);

    let start = script.find("var my = ").unwrap() + "var my = ".len();
    let end = script.rfind("};").unwrap();
    let parsed: Value = serde_json::from_str(&script[start..=end]).unwrap();
    for key in [
        "Context", "GET", "Locale", "Realm", "Registry", "URL", "_ssr_diag", "cookies",
        "hostname", "mode", "path", "prefix", "token", "token_exp", "urlid", "uuid",
    ] {
        assert!(parsed.get(key).is_some(), "missing {key}");
    }
    assert_eq!(parsed["GET"]["q"], json!("</script>"));
    assert_eq!(parsed["token_exp"], json!(1_000));
}

/// Injection targets only the first closing head tag.
#[test]
fn inject_before_head_close() {
    let html = "<html><head><title>x</title></head><body></head></body></html>";
    let out = inject_script(html, "<script></script>");
    assert_eq!(
        out,
        "<html><head><title>x</title><script></script></head><body></head></body></html>"
    );
    assert_eq!(inject_script("<p>no head</p>", "<script></script>"), "<p>no head</p>");
}

/// Version placeholders are replaced everywhere.
#[test]
fn version_placeholder_replacement() {
    let html = "<meta content=\"%GIT_VERSION%\"><script src=\"a.js?v=%GIT_VERSION%\">";
    assert_eq!(
        inject_version(html, "%GIT_VERSION%", "abc1234"),
        "<meta content=\"abc1234\"><script src=\"a.js?v=abc1234\">"
    );
    assert_eq!(inject_version(html, "", "abc1234"), html);
}

/// Query splitting treats an empty query as absent.
#[test]
fn query_helpers() {
    assert_eq!(split_request_url("/a?b=1"), ("/a", Some("b=1")));
    assert_eq!(split_request_url("/a?"), ("/a", None));
    assert_eq!(split_request_url("/a"), ("/a", None));
    let query = parse_query("a=1&b=x%20y&a=3");
    assert_eq!(query.get("a").map(String::as_str), Some("3"));
    assert_eq!(query.get("b").map(String::as_str), Some("x y"));
}
