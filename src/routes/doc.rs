use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        albums::{AlbumList, BulkInsertResponse, CreateAlbumRequest, UpdateAlbumRequest},
        auth::{LoginRequest, LoginResponse},
        carts::{
            AddCartItemRequest, CartList, CreateCartRequest, ReplaceCartRequest,
            SetQuantityRequest,
        },
        data::{CollectionReport, LoadReport},
        orders::{
            CreateOrderRequest, OrderLineRequest, OrderList, UpdateOrderRequest,
            UpdateOrderStatusRequest,
        },
        reviews::{ReviewList, ReviewRequest},
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    error::ErrorBody,
    models::{
        Album, Cart, CartItem, DocumentId, Order, OrderItem, OrderStatus, Review, Role,
        ShippingDetails, User,
    },
    response::{ApiResponse, Meta},
    routes::{albums, auth, carts, data, health, orders, params, reviews, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        albums::list_albums,
        albums::get_album,
        albums::create_album,
        albums::create_albums,
        albums::update_album,
        albums::delete_album,
        carts::list_carts,
        carts::get_cart,
        carts::get_user_cart,
        carts::create_cart,
        carts::replace_cart,
        carts::delete_cart,
        carts::add_item,
        carts::remove_item,
        carts::set_item_quantity,
        carts::recompute_total,
        carts::clear_cart,
        orders::list_orders,
        orders::list_user_orders,
        orders::get_order,
        orders::create_order,
        orders::update_order,
        orders::update_status,
        orders::update_shipping,
        orders::delete_order,
        reviews::list_reviews,
        reviews::list_album_reviews,
        reviews::list_user_reviews,
        reviews::get_review,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        data::load_data
    ),
    components(
        schemas(
            DocumentId,
            Role,
            OrderStatus,
            ShippingDetails,
            Album,
            Cart,
            CartItem,
            Order,
            OrderItem,
            Review,
            User,
            ErrorBody,
            Meta,
            LoginRequest,
            LoginResponse,
            CreateAlbumRequest,
            UpdateAlbumRequest,
            BulkInsertResponse,
            AlbumList,
            CreateCartRequest,
            ReplaceCartRequest,
            AddCartItemRequest,
            SetQuantityRequest,
            CartList,
            CreateOrderRequest,
            OrderLineRequest,
            UpdateOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            ReviewRequest,
            ReviewList,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            CollectionReport,
            LoadReport,
            params::Pagination,
            params::AlbumQuery,
            health::HealthData,
            ApiResponse<Album>,
            ApiResponse<AlbumList>,
            ApiResponse<Cart>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<Review>,
            ApiResponse<User>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Token issuing"),
        (name = "Albums", description = "Catalogue, public reads and staff writes"),
        (name = "Carts", description = "Shopping carts"),
        (name = "Orders", description = "Order placement and fulfilment"),
        (name = "Reviews", description = "Album reviews"),
        (name = "Users", description = "User administration"),
        (name = "Data", description = "Fixture reload"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
