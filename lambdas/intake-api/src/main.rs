use aws_config::BehaviorVersion;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use domain::{
    intake::{
        self, cqrs::DynamoIntakeStore, inputs::{AddBatchInput, OpenIntakeInput}, BatchField,
        Command, IntakeServices, MedicineField, StockIntake,
    },
    medicines::{
        self, inputs::{SearchInput, UpdateMedicineInput}, listing::NO_MEDICINES,
        DynamoMedicineRepository, ListingState, MedicineRepository,
    },
    notify::{Notice, Notices},
    session::{AuthGate, PendingRedirect, Session},
    users::{
        inputs::{LoginInput, SignupInput},
        Accounts, DynamoUserStore,
    },
    Config, Error,
};
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
struct AppState {
    intake: Arc<StockIntake<DynamoIntakeStore>>,
    medicines: Arc<DynamoMedicineRepository>,
    users: Arc<DynamoUserStore>,
    gate: AuthGate,
    max_search_limit: u32,
}

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let state = build_state().await?;

    let app = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/intake", post(create_intake))
        .route("/intake/:id", get(get_intake))
        .route("/intake/:id/batches", post(add_batch))
        .route(
            "/intake/:id/batches/:batch_id",
            put(update_batch).delete(remove_batch),
        )
        .route("/intake/:id/batches/:batch_id/medicines", post(add_medicine))
        .route(
            "/intake/:id/batches/:batch_id/medicines/:medicine_id",
            put(update_medicine).delete(remove_medicine),
        )
        .route("/intake/:id/submit", post(submit_intake))
        .route("/medicines", get(list_medicines))
        .route("/medicines/search", get(search_medicines))
        .route(
            "/medicines/:id",
            put(update_stored_medicine).delete(delete_stored_medicine),
        )
        .with_state(state);

    let app = tower::ServiceBuilder::new()
        .layer(axum_aws_lambda::LambdaLayer::default())
        .service(app);

    lambda_http::run(app).await?;
    Ok(())
}

async fn build_state() -> anyhow::Result<AppState> {
    let config = Config::from_env();

    let aws = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&aws);

    let intake_repo = intake::cqrs::init_repo(dynamodb_client.clone(), &config);
    let intake_cqrs = intake::cqrs::init(
        dynamodb_client.clone(),
        &config,
        intake_repo.clone(),
        IntakeServices::default(),
    );

    let intake_store = intake::cqrs::event_store(dynamodb_client.clone(), &config);

    tracing::info!("Serving medicines from {}", config.medicines_table);

    Ok(AppState {
        intake: Arc::new(StockIntake::new(intake_cqrs, intake_store, intake_repo)),
        medicines: Arc::new(DynamoMedicineRepository::new(dynamodb_client.clone(), &config)),
        users: Arc::new(DynamoUserStore::new(dynamodb_client, &config)),
        gate: AuthGate::new(config.login_route.clone()),
        max_search_limit: config.max_search_limit,
    })
}

enum ApiError {
    Redirect { location: String, notices: Vec<Notice> },
    Domain(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Redirect { location, notices } => (
                StatusCode::SEE_OTHER,
                [(header::LOCATION, location)],
                Json(json!({ "notices": notices })),
            )
                .into_response(),
            ApiError::Domain(err) => {
                let status = match err {
                    Error::NotFound { .. } => StatusCode::NOT_FOUND,
                    Error::Uniqueness { .. } => StatusCode::CONFLICT,
                    Error::Forbidden => StatusCode::FORBIDDEN,
                    Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
                    Error::Validation { .. } => StatusCode::BAD_REQUEST,
                    Error::Remote { .. } => StatusCode::BAD_GATEWAY,
                    Error::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string()).into_response()
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

async fn session_from(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let session = Accounts::new(state.users.as_ref())
        .session(bearer_token(headers))
        .await?;
    Ok(session)
}

fn to_login(state: &AppState, redirect: &PendingRedirect, notices: &Notices) -> ApiError {
    ApiError::Redirect {
        location: redirect.take().unwrap_or_else(|| state.gate.login_route().to_string()),
        notices: notices.take(),
    }
}

async fn admit(state: &AppState, headers: &HeaderMap, notices: &Notices) -> Result<String, ApiError> {
    let session = session_from(state, headers).await?;
    let redirect = PendingRedirect::default();
    state
        .gate
        .admit(&session, notices, &redirect)
        .ok_or_else(|| to_login(state, &redirect, notices))
}

fn today() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

// Sign up
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = Accounts::new(state.users.as_ref()).signup(&input).await?;

    Ok((StatusCode::CREATED, Json(json!({ "user_id": user_id }))))
}

// Log in
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let session = Accounts::new(state.users.as_ref()).login(&input).await?;

    Ok(Json(session))
}

// Log out
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        Accounts::new(state.users.as_ref()).logout(token).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

// Open intake form
async fn create_intake(
    State(state): State<AppState>,
    headers: HeaderMap,
    input: Option<Json<OpenIntakeInput>>,
) -> Result<impl IntoResponse, ApiError> {
    let notices = Notices::new();
    let redirect = PendingRedirect::default();
    let session = session_from(&state, &headers).await?;

    let user_id = intake::mount_intake(
        &state.gate,
        &session,
        state.medicines.as_ref(),
        &notices,
        &redirect,
    )
    .await
    .ok_or_else(|| to_login(&state, &redirect, &notices))?;

    let purchase_date = input
        .and_then(|Json(input)| input.purchase_date)
        .unwrap_or_else(today);
    let view = state.intake.open(&user_id, &purchase_date).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "view": view, "notices": notices.take() })),
    ))
}

// Get intake form
async fn get_intake(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let notices = Notices::new();
    let user_id = admit(&state, &headers, &notices).await?;

    let view = state.intake.load(&id, &user_id).await?;
    Ok(Json(view))
}

async fn run_command(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
    command: Command,
) -> Result<Json<intake::View>, ApiError> {
    let notices = Notices::new();
    let user_id = admit(state, headers, &notices).await?;

    let view = state.intake.execute(id, &user_id, command).await?;
    Ok(Json(view))
}

// Add batch
async fn add_batch(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    input: Option<Json<AddBatchInput>>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase_date = input
        .and_then(|Json(input)| input.purchase_date)
        .unwrap_or_else(today);

    run_command(&state, &headers, &id, Command::AddBatch { purchase_date }).await
}

// Update wholesaler name or purchase date
async fn update_batch(
    Path((id, batch_id)): Path<(String, u32)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(field): Json<BatchField>,
) -> Result<impl IntoResponse, ApiError> {
    run_command(&state, &headers, &id, Command::UpdateBatch { batch_id, field }).await
}

// Remove batch
async fn remove_batch(
    Path((id, batch_id)): Path<(String, u32)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    run_command(&state, &headers, &id, Command::RemoveBatch { batch_id }).await
}

// Add medicine row
async fn add_medicine(
    Path((id, batch_id)): Path<(String, u32)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    run_command(&state, &headers, &id, Command::AddMedicine { batch_id }).await
}

// Update one medicine field
async fn update_medicine(
    Path((id, batch_id, medicine_id)): Path<(String, u32, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(field): Json<MedicineField>,
) -> Result<impl IntoResponse, ApiError> {
    let command = Command::UpdateMedicine {
        batch_id,
        medicine_id,
        field,
    };
    run_command(&state, &headers, &id, command).await
}

// Remove medicine row
async fn remove_medicine(
    Path((id, batch_id, medicine_id)): Path<(String, u32, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let command = Command::RemoveMedicine {
        batch_id,
        medicine_id,
    };
    run_command(&state, &headers, &id, command).await
}

// Confirm purchase
async fn submit_intake(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let notices = Notices::new();
    let user_id = admit(&state, &headers, &notices).await?;

    let report = state
        .intake
        .submit(&id, &user_id, &today(), state.medicines.as_ref(), &notices)
        .await?;

    Ok(Json(json!({
        "succeeded": report.succeeded(),
        "report": report,
        "notices": notices.take(),
    })))
}

// List stored medicines
async fn list_medicines(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let notices = Notices::new();
    let redirect = PendingRedirect::default();
    let session = session_from(&state, &headers).await?;

    let listing = medicines::load_listing(
        &state.gate,
        &session,
        state.medicines.as_ref(),
        &notices,
        &redirect,
    )
    .await
    .ok_or_else(|| to_login(&state, &redirect, &notices))?;

    let message = match listing {
        ListingState::Empty => Some(NO_MEDICINES),
        _ => None,
    };

    Ok(Json(json!({
        "listing": listing,
        "message": message,
        "notices": notices.take(),
    })))
}

// Search stored medicines by name
async fn search_medicines(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(input): Query<SearchInput>,
) -> Result<impl IntoResponse, ApiError> {
    let notices = Notices::new();
    let user_id = admit(&state, &headers, &notices).await?;

    let limit = input.limit.min(state.max_search_limit);
    let found = state
        .medicines
        .search_medicines(&user_id, &input.q, input.page, limit)
        .await?;

    Ok(Json(found))
}

// Update stored medicine
async fn update_stored_medicine(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<UpdateMedicineInput>,
) -> Result<impl IntoResponse, ApiError> {
    let notices = Notices::new();
    let user_id = admit(&state, &headers, &notices).await?;

    state
        .medicines
        .update_medicine(&user_id, &input.into_record(id))
        .await?;

    Ok((StatusCode::OK, "Medicine updated successfully."))
}

// Delete stored medicine
async fn delete_stored_medicine(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let notices = Notices::new();
    let user_id = admit(&state, &headers, &notices).await?;

    state.medicines.delete_medicine(&user_id, &id).await?;

    Ok((StatusCode::OK, "Medicine deleted successfully."))
}
