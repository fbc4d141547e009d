pub mod access;
pub mod filter;
pub mod image;
pub mod representation;
pub mod shopping_list;

pub use access::{Access, Denied, Granted, Owned};
pub use filter::{RecipeFilter, RecipeFilterParams};
pub use image::{DecodedImage, ImageError, ImageKind, ImageService};
pub use representation::Representer;

pub mod recipe_service;
pub mod recipe_service_impl;
pub use recipe_service::{RecipeError, RecipePayload, RecipeService, WriteMode};
pub use recipe_service_impl::SeaOrmRecipeService;

pub mod subscription_service;
pub mod subscription_service_impl;
pub use subscription_service::{SubscriptionError, SubscriptionService};
pub use subscription_service_impl::SeaOrmSubscriptionService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{AvatarUpload, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;
