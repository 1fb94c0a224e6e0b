//! JSON Schema + Markdown生成ツール
//!
//! src/domain/config.rsの設定構造から以下を自動生成します：
//! 1. JSON Schema (schema/config.json)
//! 2. Markdownドキュメント (CONFIGURATION.md)
//!
//! 実行方法:
//! ```
//! cargo run --bin generate_schema
//! ```

use schemars::schema_for;
use serde_json::{Map, Value};
use std::fs;
use Tenohira::domain::config::AppConfig;

fn main() {
    println!("JSON Schema + Markdown生成中...");

    // AppConfigからJSON Schemaを生成
    let schema = schema_for!(AppConfig);
    let json = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema to JSON");

    fs::create_dir_all("schema").expect("Failed to create schema/ directory");
    fs::write("schema/config.json", &json).expect("Failed to write schema/config.json");
    println!("  ✓ schema/config.json");

    let schema_value: Value = serde_json::from_str(&json).expect("Failed to parse generated schema");
    let markdown = generate_markdown(&schema_value);

    fs::write("CONFIGURATION.md", markdown).expect("Failed to write CONFIGURATION.md");
    println!("  ✓ CONFIGURATION.md");

    println!("✅ 生成完了: schema/config.json + CONFIGURATION.md");
}

/// JSON Schemaからマークダウンドキュメントを生成
fn generate_markdown(schema: &Value) -> String {
    let mut md = String::new();

    md.push_str("# 設定リファレンス (Configuration Reference)\n\n");
    md.push_str("`config.toml`は、Tenohiraの動作を制御する設定ファイルです。\n\n");
    md.push_str("**設定ファイルの場所**: `config.toml` (プロジェクトルート、--configで変更可)  \n");
    md.push_str("**スキーマファイル**: `schema/config.json` (自動生成)  \n");
    md.push_str("**サンプル**: `config.toml.example`\n\n");
    md.push_str("⚠️ このドキュメントは `cargo run --bin generate_schema` で自動生成されます。\n");
    md.push_str("説明を変更する場合は `src/domain/config.rs` のdoc commentsを編集してください。\n\n");
    md.push_str("ファイルが存在しない・パースできない場合はデフォルト値で起動します（警告ログ出力）。\n\n");
    md.push_str("## 設定項目\n\n");

    let defs = schema
        .get("$defs")
        .and_then(|d| d.as_object())
        .cloned()
        .unwrap_or_default();

    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, prop) in props {
            md.push_str(&format!("### [{}] - {}\n\n", key, section_name(key)));

            if let Some(desc) = prop.get("description").and_then(|d| d.as_str()) {
                md.push_str(&format!("{}\n\n", desc));
            }

            if let Some(resolved) = resolve_ref(prop, &defs) {
                properties_table(&mut md, resolved, &defs);
            } else if prop.get("properties").is_some() {
                properties_table(&mut md, prop, &defs);
            }
        }
    }

    md
}

/// $refを$defs経由で解決
fn resolve_ref<'a>(schema: &'a Value, defs: &'a Map<String, Value>) -> Option<&'a Value> {
    let ref_str = schema.get("$ref")?.as_str()?;
    let def_name = ref_str.strip_prefix("#/$defs/")?;
    defs.get(def_name)
}

/// プロパティテーブルを生成
fn properties_table(md: &mut String, schema: &Value, defs: &Map<String, Value>) {
    let Some(props) = schema.get("properties").and_then(|p| p.as_object()) else {
        return;
    };
    if props.is_empty() {
        return;
    }

    md.push_str("| 設定項目 | 型 | デフォルト | 説明 |\n");
    md.push_str("|---------|-----|-----------|------|\n");

    for (name, prop) in props {
        md.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            name,
            type_string(prop, defs),
            default_value(prop),
            description(prop, defs)
        ));
    }

    md.push('\n');
}

/// 型を文字列で取得
fn type_string(schema: &Value, defs: &Map<String, Value>) -> String {
    if let Some(def_schema) = resolve_ref(schema, defs) {
        if def_schema.get("enum").is_some() || def_schema.get("oneOf").is_some() {
            return "enum".to_string();
        }
        if def_schema.get("type").and_then(|t| t.as_str()) == Some("object") {
            return "object".to_string();
        }
    }

    if schema.get("enum").is_some() {
        return "enum".to_string();
    }

    match schema.get("type") {
        Some(Value::String(type_str)) => match type_str.as_str() {
            "integer" | "number" => schema
                .get("format")
                .and_then(|f| f.as_str())
                .unwrap_or(type_str)
                .to_string(),
            "boolean" => "bool".to_string(),
            other => other.to_string(),
        },
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" | "),
        _ => "unknown".to_string(),
    }
}

/// デフォルト値を取得
fn default_value(schema: &Value) -> String {
    match schema.get("default") {
        Some(Value::String(s)) => format!("`\"{}\"`", s),
        Some(Value::Number(n)) => format!("`{}`", n),
        Some(Value::Bool(b)) => format!("`{}`", b),
        _ => "-".to_string(),
    }
}

/// 説明文を取得（テーブルセル用に整形）
fn description(schema: &Value, defs: &Map<String, Value>) -> String {
    if let Some(desc) = schema.get("description").and_then(|d| d.as_str()) {
        return desc
            .replace("\n\n", "<br><br>")
            .replace('\n', " ")
            .replace('|', "\\|");
    }

    let enum_source = resolve_ref(schema, defs).unwrap_or(schema);
    if let Some(enum_vals) = enum_source.get("enum").and_then(|e| e.as_array()) {
        let vals: Vec<String> = enum_vals
            .iter()
            .filter_map(|v| v.as_str().map(|s| format!("`{}`", s)))
            .collect();
        if !vals.is_empty() {
            return format!("値: {}", vals.join(", "));
        }
    }

    "-".to_string()
}

/// セクション名をフォーマット
fn section_name(key: &str) -> String {
    match key {
        "camera" => "カメラ設定".to_string(),
        "tracker" => "ランドマーク検出設定".to_string(),
        "control" => "制御設定".to_string(),
        "actions" => "ジェスチャーアクション対応表".to_string(),
        "preview" => "プレビュー設定".to_string(),
        "pipeline" => "パイプライン設定".to_string(),
        _ => key.to_string(),
    }
}
