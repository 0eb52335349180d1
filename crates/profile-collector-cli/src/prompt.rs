use async_trait::async_trait;
use profile_collector_http::AccessTokenSource;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// Asks for the access token issued by the Facebook login dialog. An empty
/// line or end of input counts as a cancelled login.
pub struct PromptAccessToken<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
}

impl PromptAccessToken<BufReader<tokio::io::Stdin>, tokio::io::Stderr> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr())
    }
}

impl<R, W> PromptAccessToken<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }
}

#[async_trait(?Send)]
impl<R, W> AccessTokenSource for PromptAccessToken<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn access_token(&self, scope: &str) -> Option<String> {
        {
            let mut output = self.output.lock().await;
            let prompt =
                format!("Complete Facebook login (scope: {scope}) and paste the access token, or press Enter to cancel: ");
            let _ = output.write_all(prompt.as_bytes()).await;
            let _ = output.flush().await;
        }

        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await.ok()?;
        if read == 0 {
            return None;
        }
        let token = line.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}
