//! Challenge-aware request execution.
//!
//! Runs a request through the retry protocol:
//! 1. Send the request once without a challenge token.
//! 2. On success, or on a failure without the challenge marker, stop there.
//! 3. When the marker is present and both a widget and a site key are
//!    configured, show the widget once and resend with the minted token.
//! 4. The second outcome is final, even if it is flagged again.
//!
//! A request therefore costs at most two attempts and at most one widget
//! interaction. A dismissed widget surfaces as the distinguished
//! cancellation failure; any other widget breakage surfaces the failure
//! that triggered the challenge in the first place.

use std::sync::Arc;

use log::{debug, info, warn};

use super::detect::needs_challenge;
use super::widget::{ChallengePrompt, ChallengeWidget, ChallengeWidgetError};
use crate::transport::{ApiFailure, ApiRequest, ApiResponse, HttpTransport};

pub async fn execute_with_challenge_retry(
    transport: Arc<dyn HttpTransport>,
    request: &ApiRequest,
    widget: Option<Arc<dyn ChallengeWidget>>,
    site_key: Option<&str>,
) -> Result<ApiResponse, ApiFailure> {
    let failure = match transport.send(request).await {
        Ok(response) => return Ok(response),
        Err(failure) => failure,
    };

    if !needs_challenge(&failure) {
        return Err(failure);
    }

    let (Some(widget), Some(site_key)) = (widget, site_key) else {
        debug!("challenge requested for {} but no widget is wired", request.url);
        return Err(failure);
    };

    info!("challenge requested for {}, opening {}", request.url, widget.name());
    let prompt = ChallengePrompt::new(site_key, request.url.clone());
    let token = match widget.solve(&prompt).await {
        Ok(token) => token,
        Err(ChallengeWidgetError::Cancelled) => {
            debug!("challenge dismissed by the user");
            return Err(ApiFailure::ChallengeCancelled);
        }
        Err(err) => {
            warn!("challenge widget failed, surfacing the original failure: {err}");
            return Err(failure);
        }
    };

    let retry = request.clone().with_challenge_token(Some(token.token));
    transport.send(&retry).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use http::{HeaderMap, Method};
    use url::Url;

    use super::*;
    use crate::challenge::widget::{ChallengeResult, ChallengeToken};
    use crate::transport::ErrorBody;

    struct StubTransport {
        outcomes: Mutex<Vec<Result<ApiResponse, ApiFailure>>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl StubTransport {
        fn new(outcomes: Vec<Result<ApiResponse, ApiFailure>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request(&self, index: usize) -> ApiRequest {
            self.requests.lock().unwrap()[index].clone()
        }
    }

    #[async_trait::async_trait]
    impl HttpTransport for StubTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiFailure> {
            self.requests.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .expect("no more stub outcomes")
        }
    }

    enum WidgetScript {
        Token(&'static str),
        Cancel,
        Break,
    }

    struct StubWidget {
        script: WidgetScript,
        calls: Mutex<u32>,
    }

    impl StubWidget {
        fn new(script: WidgetScript) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: Mutex::new(0),
            })
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl ChallengeWidget for StubWidget {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn solve(&self, _prompt: &ChallengePrompt) -> ChallengeResult {
            *self.calls.lock().unwrap() += 1;
            match self.script {
                WidgetScript::Token(token) => Ok(ChallengeToken::new(token)),
                WidgetScript::Cancel => Err(ChallengeWidgetError::Cancelled),
                WidgetScript::Break => Err(ChallengeWidgetError::Failed("script error".into())),
            }
        }
    }

    fn request() -> ApiRequest {
        ApiRequest::new(
            Method::POST,
            Url::parse("https://blog.example.com/api/add").unwrap(),
        )
    }

    fn ok_response() -> Result<ApiResponse, ApiFailure> {
        Ok(ApiResponse::new(
            200,
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
            Url::parse("https://blog.example.com/api/add").unwrap(),
        ))
    }

    fn flagged_failure(status: u16) -> Result<ApiResponse, ApiFailure> {
        Err(ApiFailure::Http {
            status,
            body: ErrorBody {
                need_challenge: true,
                ..Default::default()
            },
        })
    }

    fn plain_failure(status: u16) -> Result<ApiResponse, ApiFailure> {
        Err(ApiFailure::Http {
            status,
            body: ErrorBody::default(),
        })
    }

    #[tokio::test]
    async fn success_never_consults_the_widget() {
        let transport = StubTransport::new(vec![ok_response()]);
        let widget = StubWidget::new(WidgetScript::Token("unused"));

        let result = execute_with_challenge_retry(
            transport.clone(),
            &request(),
            Some(widget.clone()),
            Some("site-key"),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(transport.request_count(), 1);
        assert_eq!(widget.call_count(), 0);
    }

    #[tokio::test]
    async fn plain_failure_passes_through_untouched() {
        let transport = StubTransport::new(vec![plain_failure(500)]);
        let widget = StubWidget::new(WidgetScript::Token("unused"));

        let result = execute_with_challenge_retry(
            transport.clone(),
            &request(),
            Some(widget.clone()),
            Some("site-key"),
        )
        .await;

        assert_eq!(result.unwrap_err().status(), Some(500));
        assert_eq!(transport.request_count(), 1);
        assert_eq!(widget.call_count(), 0);
    }

    #[tokio::test]
    async fn flagged_failure_retries_once_with_the_token() {
        let transport = StubTransport::new(vec![flagged_failure(403), ok_response()]);
        let widget = StubWidget::new(WidgetScript::Token("tok123"));

        let result = execute_with_challenge_retry(
            transport.clone(),
            &request(),
            Some(widget.clone()),
            Some("site-key"),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(transport.request_count(), 2);
        assert_eq!(widget.call_count(), 1);
        assert_eq!(transport.request(0).challenge_token, None);
        assert_eq!(
            transport.request(1).challenge_token.as_deref(),
            Some("tok123")
        );
    }

    #[tokio::test]
    async fn second_flagged_failure_is_final() {
        let transport = StubTransport::new(vec![flagged_failure(403), flagged_failure(403)]);
        let widget = StubWidget::new(WidgetScript::Token("tok123"));

        let result = execute_with_challenge_retry(
            transport.clone(),
            &request(),
            Some(widget.clone()),
            Some("site-key"),
        )
        .await;

        let failure = result.unwrap_err();
        assert!(needs_challenge(&failure));
        assert_eq!(transport.request_count(), 2);
        assert_eq!(widget.call_count(), 1);
    }

    #[tokio::test]
    async fn dismissal_maps_to_the_cancelled_failure() {
        let transport = StubTransport::new(vec![flagged_failure(403)]);
        let widget = StubWidget::new(WidgetScript::Cancel);

        let result = execute_with_challenge_retry(
            transport.clone(),
            &request(),
            Some(widget.clone()),
            Some("site-key"),
        )
        .await;

        assert!(matches!(
            result.unwrap_err(),
            ApiFailure::ChallengeCancelled
        ));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn widget_breakage_surfaces_the_original_failure() {
        let transport = StubTransport::new(vec![flagged_failure(403)]);
        let widget = StubWidget::new(WidgetScript::Break);

        let result = execute_with_challenge_retry(
            transport.clone(),
            &request(),
            Some(widget.clone()),
            Some("site-key"),
        )
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.status(), Some(403));
        assert!(needs_challenge(&failure));
    }

    #[tokio::test]
    async fn missing_widget_propagates_the_original_failure() {
        let transport = StubTransport::new(vec![flagged_failure(403)]);

        let result =
            execute_with_challenge_retry(transport.clone(), &request(), None, Some("site-key"))
                .await;

        assert_eq!(result.unwrap_err().status(), Some(403));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn missing_site_key_propagates_the_original_failure() {
        let transport = StubTransport::new(vec![flagged_failure(403)]);
        let widget = StubWidget::new(WidgetScript::Token("unused"));

        let result =
            execute_with_challenge_retry(transport.clone(), &request(), Some(widget.clone()), None)
                .await;

        assert_eq!(result.unwrap_err().status(), Some(403));
        assert_eq!(widget.call_count(), 0);
    }
}
