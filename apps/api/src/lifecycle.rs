//! # プロセスライフサイクル
//!
//! プロセス全体の致命的エラー処理とシャットダウン手順を定義する。
//!
//! ## 状態遷移
//!
//! ```text
//! STARTING → LISTENING → TERMINATED            （捕捉されない同期的欠陥）
//! STARTING → LISTENING → DRAINING → TERMINATED （未処理の非同期エラー）
//! ```
//!
//! ## 2 つの致命的エラー経路
//!
//! - **捕捉されない同期的欠陥（panic）**: プログラムの状態が未定義になっているため、
//!   処理中のリクエストを待たずに直ちに終了する（[`install_panic_hook`]）。
//! - **未処理の非同期エラー**: 失敗は単一の非同期タスク（例: 起動時の DB 接続）に
//!   閉じていると推定できるため、新規接続の受付を止め、処理中のリクエストの完了を
//!   待ってから終了する。ただし排出は [`DRAIN_TIMEOUT`] を上限とする。
//!
//! どちらの経路も終了コードは 1。

use std::time::Duration;

use tokio::sync::mpsc;

/// graceful shutdown 時の排出期限
///
/// 処理が終わらないハンドラに終了を無期限に阻止させないための上限。
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// 致命的エラーの報告ハンドル
///
/// バックグラウンドタスクにクローンして渡し、回復不能なエラーを
/// プロセスのシャットダウン経路に報告する。
#[derive(Debug, Clone)]
pub struct FatalErrorHandle {
    tx: mpsc::UnboundedSender<anyhow::Error>,
}

impl FatalErrorHandle {
    /// 致命的エラーを報告する
    ///
    /// 受信側がすでに終了処理中の場合、エラーは黙って破棄される
    /// （最初の 1 件だけがシャットダウンを駆動する）。
    pub fn report(&self, error: anyhow::Error) {
        let _ = self.tx.send(error);
    }
}

/// 致命的エラーの受信側
#[derive(Debug)]
pub struct FatalErrorReceiver {
    rx: mpsc::UnboundedReceiver<anyhow::Error>,
}

impl FatalErrorReceiver {
    /// 最初の致命的エラーを待つ
    ///
    /// graceful shutdown のシグナルとして serve に渡す。
    /// すべての送信側がドロップされた場合は永久に解決しない
    /// （致命的エラーが起こり得ないならシャットダウンも起こらない）。
    pub async fn wait(mut self) -> anyhow::Error {
        match self.rx.recv().await {
            Some(error) => error,
            None => std::future::pending().await,
        }
    }
}

/// 致命的エラーチャネルを作成する
pub fn fatal_error_channel() -> (FatalErrorHandle, FatalErrorReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FatalErrorHandle { tx }, FatalErrorReceiver { rx })
}

/// 捕捉されない同期的欠陥（panic）のフックをインストールする
///
/// panic はプログラムの状態が未定義であることを意味するため、
/// メッセージと発生箇所をログに残して直ちに `exit(1)` する。
/// 処理中のリクエストの排出は行わない。
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "不明な panic".to_string()
        };
        let location = info
            .location()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());

        tracing::error!(%message, %location, "捕捉されない欠陥が発生しました。直ちに終了します");
        std::process::exit(1);
    }));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_報告されたエラーがwaitで受信される() {
        let (handle, receiver) = fatal_error_channel();

        handle.report(anyhow::anyhow!("データベース接続に失敗しました"));

        let error = receiver.wait().await;
        assert_eq!(error.to_string(), "データベース接続に失敗しました");
    }

    #[tokio::test]
    async fn test_最初のエラーだけがシャットダウンを駆動する() {
        let (handle, receiver) = fatal_error_channel();

        handle.report(anyhow::anyhow!("一次エラー"));
        handle.report(anyhow::anyhow!("二次エラー"));

        let error = receiver.wait().await;
        assert_eq!(error.to_string(), "一次エラー");
    }

    #[tokio::test]
    async fn test_エラーが無ければwaitは解決しない() {
        let (handle, receiver) = fatal_error_channel();

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(50), receiver.wait()).await;

        assert!(result.is_err(), "タイムアウトすること");
        drop(handle);
    }
}
