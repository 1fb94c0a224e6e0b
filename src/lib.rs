//! Tenohira - Library
//!
//! このライブラリは、バイナリターゲット（schema生成など）と統合テストから
//! プロジェクトのモジュールにアクセスするために提供されています。

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod logging;
