//! Application Layer
//!
//! 制御ループ、ジェスチャー→アクション変換、カメラ再オープンロジック、
//! 統計管理などのユースケースを実装します。
//!
//! ## モジュール構成
//! - `pipeline`: 単一スレッドの制御ループ（キャプチャ→検出→分類→注入）
//! - `controller`: ジェスチャー→アクション状態機械（ホールド・クールダウン）
//! - `cursor`: カーソル座標の写像とEMA平滑化
//! - `recovery`: カメラ再オープンロジック（指数バックオフ）
//! - `stats`: 統計情報管理（FPS、レイテンシ、再オープン回数）

pub mod controller;
pub mod cursor;
pub mod pipeline;
pub mod recovery;
pub mod stats;
