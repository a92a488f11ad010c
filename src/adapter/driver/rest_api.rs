use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, FromRef, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::adapter::driver::auth::{AuthenticatedUser, JwtVerifier};
use crate::adapter::driver::request_dto::{
    CreateBookingRequest, CreateEventRequest, UpdateEventRequest, UpdateProfileRequest,
    UpdateUserRequest,
};
use crate::adapter::driver::response_dto::{
    BookingDetailResponse, BookingMessageResponse, BookingResponse, EventMessageResponse,
    EventResponse, MessageResponse, UserProfileResponse,
};
use crate::application::service::{
    BookingApplicationService, BookingQueryService, EventApplicationService, EventChanges,
    EventQueryService, ProfileChanges, UserApplicationService, UserChanges, UserQueryService,
};
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{BookingId, EventId, Role, UserId};
use crate::domain::port::{BookingRepository, EventRepository, UserDirectory};

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub booking_service: Arc<BookingApplicationService>,
    pub event_service: Arc<EventApplicationService>,
    pub user_service: Arc<UserApplicationService>,
    pub booking_query_service: Arc<BookingQueryService>,
    pub event_query_service: Arc<EventQueryService>,
    pub user_query_service: Arc<UserQueryService>,
    pub jwt_verifier: Arc<JwtVerifier>,
}

impl AppState {
    /// リポジトリからすべてのサービスを組み立てる
    pub fn new(
        event_repository: Arc<dyn EventRepository>,
        booking_repository: Arc<dyn BookingRepository>,
        user_directory: Arc<dyn UserDirectory>,
        jwt_verifier: JwtVerifier,
    ) -> Self {
        Self {
            booking_service: Arc::new(BookingApplicationService::new(
                event_repository.clone(),
                booking_repository.clone(),
            )),
            event_service: Arc::new(EventApplicationService::new(event_repository.clone())),
            user_service: Arc::new(UserApplicationService::new(user_directory.clone())),
            booking_query_service: Arc::new(BookingQueryService::new(
                booking_repository,
                event_repository.clone(),
                user_directory.clone(),
            )),
            event_query_service: Arc::new(EventQueryService::new(event_repository)),
            user_query_service: Arc::new(UserQueryService::new(user_directory)),
            jwt_verifier: Arc::new(jwt_verifier),
        }
    }
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_verifier.clone()
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/events", get(get_events).post(create_event))
        .route("/api/v1/events/mine", get(get_my_events))
        .route(
            "/api/v1/events/:event_id",
            get(get_event_by_id).put(update_event).delete(delete_event),
        )
        .route("/api/v1/bookings", post(create_booking))
        .route(
            "/api/v1/bookings/:booking_id",
            get(get_booking_by_id).delete(cancel_booking),
        )
        .route("/api/v1/users/bookings", get(get_my_bookings))
        .route("/api/v1/users", get(get_users))
        .route("/api/v1/users/profile", get(get_profile).put(update_profile))
        .route(
            "/api/v1/users/:user_id",
            get(get_user_by_id).put(update_user).delete(delete_user),
        )
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "event-ticketing",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// イベント一覧取得エンドポイント（認証不要）
async fn get_events(State(state): State<AppState>) -> ApiResult<Json<Vec<EventResponse>>> {
    let events = state
        .event_query_service
        .get_all_events()
        .await
        .map_err(map_application_error)?;

    Ok(Json(events.iter().map(EventResponse::from_event).collect()))
}

// 主催者自身のイベント一覧取得エンドポイント
async fn get_my_events(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<EventResponse>>> {
    user.require_role(&[Role::Organizer])?;

    let events = state
        .event_query_service
        .get_events_by_organizer(user.0.user_id())
        .await
        .map_err(map_application_error)?;

    Ok(Json(events.iter().map(EventResponse::from_event).collect()))
}

// イベント詳細取得エンドポイント（認証不要）
async fn get_event_by_id(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<EventResponse>> {
    let event_id = EventId::from_uuid(parse_id(path, "イベント")?);

    match state.event_query_service.get_event_by_id(event_id).await {
        Ok(Some(event)) => Ok(Json(EventResponse::from_event(&event))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: "Event not found".to_string(),
                code: "EVENT_NOT_FOUND".to_string(),
            }),
        )),
        Err(err) => Err(map_application_error(err)),
    }
}

// イベント登録エンドポイント
async fn create_event(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EventMessageResponse>)> {
    user.require_role(&[Role::Organizer])?;
    let Json(request) = body.map_err(map_json_rejection)?;

    let (details, ticket_price, total_tickets) = request
        .into_parts()
        .map_err(|err| map_application_error(err.into()))?;

    let event = state
        .event_service
        .create_event(details, ticket_price, total_tickets, &user.0)
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(EventMessageResponse {
            message: "Event created successfully".to_string(),
            event: EventResponse::from_event(&event),
        }),
    ))
}

// イベント更新エンドポイント
async fn update_event(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> ApiResult<Json<EventMessageResponse>> {
    user.require_role(&[Role::Organizer, Role::Admin])?;
    let event_id = EventId::from_uuid(parse_id(path, "イベント")?);
    let Json(request) = body.map_err(map_json_rejection)?;

    let changes =
        EventChanges::try_from(request).map_err(|err| map_application_error(err.into()))?;

    let event = state
        .event_service
        .update_event(event_id, changes, &user.0)
        .await
        .map_err(map_application_error)?;

    Ok(Json(EventMessageResponse {
        message: "Event updated successfully".to_string(),
        event: EventResponse::from_event(&event),
    }))
}

// イベント削除エンドポイント
async fn delete_event(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    user.require_role(&[Role::Organizer, Role::Admin])?;
    let event_id = EventId::from_uuid(parse_id(path, "イベント")?);

    state
        .event_service
        .delete_event(event_id, &user.0)
        .await
        .map_err(map_application_error)?;

    Ok(Json(MessageResponse {
        message: "Event deleted successfully".to_string(),
    }))
}

// チケット予約エンドポイント
async fn create_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BookingMessageResponse>)> {
    user.require_role(&[Role::User])?;
    let Json(request) = body.map_err(map_json_rejection)?;

    // 枚数の検証はイベントの参照より先に行う
    let quantity = request
        .quantity()
        .map_err(|err| map_application_error(err.into()))?;

    let booking = state
        .booking_service
        .reserve(EventId::from_uuid(request.event), quantity, &user.0)
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(BookingMessageResponse {
            message: "Booking successful".to_string(),
            booking: BookingResponse::from_booking(&booking),
        }),
    ))
}

// 予約詳細取得エンドポイント
async fn get_booking_by_id(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<BookingDetailResponse>> {
    user.require_role(&[Role::User])?;
    let booking_id = BookingId::from_uuid(parse_id(path, "予約")?);

    let details = state
        .booking_query_service
        .get_booking(booking_id, &user.0)
        .await
        .map_err(map_application_error)?;

    Ok(Json(BookingDetailResponse::from_details(&details)))
}

// 予約キャンセルエンドポイント
async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<BookingMessageResponse>> {
    user.require_role(&[Role::User])?;
    let booking_id = BookingId::from_uuid(parse_id(path, "予約")?);

    let booking = state
        .booking_service
        .cancel(booking_id, &user.0)
        .await
        .map_err(map_application_error)?;

    Ok(Json(BookingMessageResponse {
        message: "Booking canceled successfully".to_string(),
        booking: BookingResponse::from_booking(&booking),
    }))
}

// 自分の予約一覧取得エンドポイント
async fn get_my_bookings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<BookingDetailResponse>>> {
    user.require_role(&[Role::User])?;

    let bookings = state
        .booking_query_service
        .list_bookings_for_user(user.0.user_id())
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        bookings
            .iter()
            .map(BookingDetailResponse::from_details)
            .collect(),
    ))
}

// プロフィール取得エンドポイント
async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserProfileResponse>> {
    user.require_role(&[Role::User, Role::Organizer, Role::Admin])?;

    let profile = state
        .user_query_service
        .get_profile(&user.0)
        .await
        .map_err(map_application_error)?;

    Ok(Json(UserProfileResponse::from_profile(&profile)))
}

// プロフィール更新エンドポイント
async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<UserProfileResponse>> {
    user.require_role(&[Role::User, Role::Organizer, Role::Admin])?;
    let Json(request) = body.map_err(map_json_rejection)?;

    let profile = state
        .user_service
        .update_profile(ProfileChanges::from(request), &user.0)
        .await
        .map_err(map_application_error)?;

    Ok(Json(UserProfileResponse::from_profile(&profile)))
}

// ユーザー一覧取得エンドポイント（管理者のみ）
async fn get_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<UserProfileResponse>>> {
    user.require_role(&[Role::Admin])?;

    let users = state
        .user_query_service
        .list_users(&user.0)
        .await
        .map_err(map_application_error)?;

    Ok(Json(users.iter().map(UserProfileResponse::from_profile).collect()))
}

// ユーザー詳細取得エンドポイント（管理者のみ）
async fn get_user_by_id(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<UserProfileResponse>> {
    user.require_role(&[Role::Admin])?;
    let user_id = UserId::from_uuid(parse_id(path, "ユーザー")?);

    let profile = state
        .user_query_service
        .get_user(user_id, &user.0)
        .await
        .map_err(map_application_error)?;

    Ok(Json(UserProfileResponse::from_profile(&profile)))
}

// ユーザー更新エンドポイント（管理者のみ）
async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserProfileResponse>> {
    user.require_role(&[Role::Admin])?;
    let user_id = UserId::from_uuid(parse_id(path, "ユーザー")?);
    let Json(request) = body.map_err(map_json_rejection)?;

    let changes =
        UserChanges::try_from(request).map_err(|err| map_application_error(err.into()))?;

    let profile = state
        .user_service
        .update_user(user_id, changes, &user.0)
        .await
        .map_err(map_application_error)?;

    Ok(Json(UserProfileResponse::from_profile(&profile)))
}

// ユーザー削除エンドポイント（管理者のみ）
async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    user.require_role(&[Role::Admin])?;
    let user_id = UserId::from_uuid(parse_id(path, "ユーザー")?);

    state
        .user_service
        .delete_user(user_id, &user.0)
        .await
        .map_err(map_application_error)?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

fn parse_id(path: Result<Path<Uuid>, PathRejection>, resource: &str) -> ApiResult<Uuid> {
    path.map(|Path(id)| id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: format!("無効な{}ID形式です", resource),
                code: "INVALID_UUID".to_string(),
            }),
        )
    })
}

fn map_json_rejection(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: rejection.body_text(),
            code: "INVALID_REQUEST".to_string(),
        }),
    )
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::DomainError(domain_err) => map_domain_error(domain_err),
        ApplicationError::RepositoryError(repo_err) => {
            error!(error = %repo_err, "repository failure while handling request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError {
                    error: format!("{}", repo_err),
                    code: "REPOSITORY_ERROR".to_string(),
                }),
            )
        }
        ApplicationError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: msg,
                code: "NOT_FOUND".to_string(),
            }),
        ),
        ApplicationError::Forbidden(msg) => (
            StatusCode::FORBIDDEN,
            Json(ApiError {
                error: msg,
                code: "FORBIDDEN".to_string(),
            }),
        ),
        ApplicationError::PersistenceConflict(msg) => (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: msg,
                code: "PERSISTENCE_CONFLICT".to_string(),
            }),
        ),
        ApplicationError::Conflict(msg) => (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: msg,
                code: "CONFLICT".to_string(),
            }),
        ),
    }
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<ApiError>) {
    let code = match &domain_err {
        DomainError::InvalidQuantity => "INVALID_QUANTITY",
        DomainError::InsufficientInventory => "INSUFFICIENT_INVENTORY",
        DomainError::AlreadyCanceled => "ALREADY_CANCELED",
        DomainError::InventoryOverflow { .. } => "INVENTORY_OVERFLOW",
        DomainError::PriceOverflow => "PRICE_OVERFLOW",
        DomainError::InvalidValue(_) => "INVALID_VALUE",
    };

    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: domain_err.to_string(),
            code: code.to_string(),
        }),
    )
}
