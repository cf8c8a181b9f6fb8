// self
use oauth2_cognito::{
	_preludet::*,
	config::StrategyConfig,
	error::{ConfigError, Error, Result, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	oauth::{
		BasicFacade, CodeExchange, TransportErrorMapper,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	},
	provider::{DefaultProviderHooks, ProviderHooks},
};

#[derive(Debug)]
enum FakeTransportError {
	Throttled,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Throttled => write!(f, "Transport throttled."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
struct FakeHttpClient {
	retry_after: Duration,
}
impl FakeHttpClient {
	fn throttled(retry_after: Duration) -> Self {
		Self { retry_after }
	}
}
impl TokenHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, retry_after: self.retry_after }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	retry_after: Duration,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let retry_after = self.retry_after;
		let form = String::from_utf8_lossy(request.body()).into_owned();

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);
			assert!(form.contains("grant_type=authorization_code"));
			assert!(form.contains("code=throttled-code"));
			assert!(form.contains("code_verifier=verifier-"));

			slot.store(ResponseMetadata { status: Some(429), retry_after: Some(retry_after) });

			Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Throttled)))
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	metadata: Arc<Mutex<Vec<Option<ResponseMetadata>>>>,
}
impl RecordingTransportErrorMapper {
	fn recorded_metadata(&self) -> Vec<Option<ResponseMetadata>> {
		self.metadata.lock().clone()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		hooks: &dyn ProviderHooks,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> Error {
		let status = meta.and_then(|value| value.status);
		let retry_after = meta.and_then(|value| value.retry_after);

		self.metadata.lock().push(meta.cloned());

		let _ = hooks;

		match err {
			HttpClientError::Reqwest(inner) => TransientError::TokenEndpoint {
				message: format!("Fake transport error: {inner}"),
				status,
				retry_after,
			}
			.into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			other => TransientError::TokenEndpoint {
				message: format!(
					"Unhandled HTTP client error while calling the token endpoint: {other:?}"
				),
				status,
				retry_after,
			}
			.into(),
		}
	}
}

fn build_config() -> StrategyConfig {
	StrategyConfig::builder()
		.domain("mock.auth.us-east-1.amazoncognito.com")
		.client_id("throttled-client")
		.client_secret("throttled-secret")
		.callback_url("https://app.example.com/auth/callback")
		.region("us-east-1")
		.build()
		.expect("Failed to build mock strategy configuration.")
}

fn build_facade(
	retry_after: Duration,
	mapper: Arc<RecordingTransportErrorMapper>,
) -> BasicFacade<FakeHttpClient, RecordingTransportErrorMapper> {
	let hooks: Arc<dyn ProviderHooks> = Arc::new(DefaultProviderHooks);

	BasicFacade::from_config(
		&build_config(),
		hooks,
		Arc::new(FakeHttpClient::throttled(retry_after)),
		mapper,
	)
	.expect("Failed to build facade over the fake transport.")
}

fn callback_url() -> Url {
	Url::parse("https://app.example.com/auth/callback").expect("Failed to parse callback URL.")
}

#[tokio::test]
async fn fake_token_http_client_surfaces_metadata() {
	let facade = build_facade(Duration::seconds(5), Arc::default());
	let err = facade
		.exchange_code("throttled-code", "verifier-1", &callback_url())
		.await
		.expect_err("Exchange should be throttled with HTTP 429.");

	match err {
		Error::Transient(TransientError::TokenEndpoint { status, retry_after, .. }) => {
			assert_eq!(status, Some(429));
			assert_eq!(retry_after, Some(Duration::seconds(5)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn fake_mapper_captures_response_metadata() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let facade = build_facade(Duration::seconds(30), mapper.clone());
	let _ = facade
		.exchange_code("throttled-code", "verifier-2", &callback_url())
		.await
		.expect_err("Exchange should be throttled with HTTP 429.");
	let observed = mapper.recorded_metadata();

	assert_eq!(observed.len(), 1, "Mapper must record a single request.");

	let meta = observed
		.first()
		.and_then(|value| value.clone())
		.expect("Response metadata should be recorded exactly once.");

	assert_eq!(meta.status, Some(429));
	assert_eq!(meta.retry_after, Some(Duration::seconds(30)));
}
