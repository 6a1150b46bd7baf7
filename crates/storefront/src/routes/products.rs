//! Product listing, product detail and review submission.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
};
use bazaar_backend::EligibilityError;
use bazaar_core::catalog::{
    AttributeValue, Brand, Category, DEFAULT_LOW_STOCK_THRESHOLD, PriceRangeSlider, Product,
    ProductImage, ProductQuery, ProductSort, StockStatus, Variant,
};
use bazaar_core::review::{Review, ReviewDraft};
use bazaar_core::variant::{self, OptionGroup, VariantError};
use bazaar_core::ProductId;
use bazaar_core::shop::Shop;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CurrentShop, RequireAuth};
use crate::state::AppState;
use crate::views::{self, Page, Pager, ProductCard, flash};

// =============================================================================
// Listing
// =============================================================================

/// Raw listing parameters. Everything arrives as text so a malformed value
/// drops that one filter instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub page: Option<String>,
    pub sort: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub q: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

fn parsed<T: std::str::FromStr>(value: Option<&String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

impl ListingParams {
    /// Listing query with the price filter clamped to the shop's slider.
    fn to_query(&self, slider: &PriceRangeSlider) -> ProductQuery {
        let (min_price, max_price) = slider.filter_bounds();
        ProductQuery {
            page: parsed(self.page.as_ref()).unwrap_or(1).max(1),
            category: parsed(self.category.as_ref()),
            brand: parsed(self.brand.as_ref()),
            search: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(String::from),
            sort: self
                .sort
                .as_deref()
                .map(ProductSort::from_param)
                .unwrap_or_default(),
            min_price,
            max_price,
            ..ProductQuery::default()
        }
    }

    fn slider(&self, shop: &Shop) -> PriceRangeSlider {
        PriceRangeSlider::with_selection(
            0,
            shop.price_filter_ceiling,
            parsed(self.min_price.as_ref()),
            parsed(self.max_price.as_ref()),
        )
    }
}

/// Listing URL for a query, keeping every filter.
#[must_use]
pub fn listing_url(query: &ProductQuery) -> String {
    let params = query.url_params();
    if params.is_empty() {
        return "/products".to_string();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("/products?{encoded}")
}

/// A filter choice in a select box.
#[derive(Clone)]
pub struct FacetOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Price slider state for the template.
#[derive(Clone)]
pub struct PriceFilterView {
    pub floor: i64,
    pub ceiling: i64,
    pub min: i64,
    pub max: i64,
    pub narrowed: bool,
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: Page,
    pub heading: String,
    pub products: Vec<ProductCard>,
    pub categories: Vec<FacetOption>,
    pub brands: Vec<FacetOption>,
    pub sorts: Vec<FacetOption>,
    pub search: String,
    pub price: PriceFilterView,
    pub pager: Pager,
    pub has_filters: bool,
    pub error: Option<String>,
}

fn facets<T>(
    items: &[T],
    selected: Option<String>,
    id: impl Fn(&T) -> String,
    name: impl Fn(&T) -> String,
) -> Vec<FacetOption> {
    items
        .iter()
        .map(|item| {
            let value = id(item);
            FacetOption {
                selected: selected.as_deref() == Some(value.as_str()),
                label: name(item),
                value,
            }
        })
        .collect()
}

/// Display the product listing.
///
/// Catalog failures render the page with no products and a banner.
#[instrument(skip(state, shop, page), fields(shop = %shop.slug))]
pub async fn index(
    State(state): State<AppState>,
    CurrentShop(shop): CurrentShop,
    page: Page,
    Query(params): Query<ListingParams>,
) -> impl IntoResponse {
    let slider = params.slider(&shop);
    let query = params.to_query(&slider);

    let (products, categories, brands) = tokio::join!(
        state.backend().products(shop.id, &query),
        state.backend().categories(shop.id),
        state.backend().brands(shop.id),
    );

    let (products, error) = match products {
        Ok(products) => (products, None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch products");
            (
                bazaar_backend::Paginated::empty(),
                Some("We could not load products right now. Please try again.".to_string()),
            )
        }
    };
    let categories: Vec<Category> = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch categories");
        Vec::new()
    });
    let brands: Vec<Brand> = brands.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch brands");
        Vec::new()
    });

    let heading = query
        .category
        .and_then(|id| categories.iter().find(|c| c.id == id))
        .map_or_else(
            || {
                query
                    .search
                    .as_ref()
                    .map_or_else(|| "All products".to_string(), |q| format!("Results for \"{q}\""))
            },
            |c| c.name.clone(),
        );

    let pagination = products.pagination(query.per_page);
    let pager = Pager::new(&pagination, |n| listing_url(&query.with_page(n)));

    ProductsIndexTemplate {
        page,
        heading,
        products: products
            .items
            .iter()
            .map(|p| ProductCard::new(p, &shop))
            .collect(),
        categories: facets(
            &categories,
            query.category.map(|c| c.to_string()),
            |c| c.id.to_string(),
            |c| c.name.clone(),
        ),
        brands: facets(
            &brands,
            query.brand.map(|b| b.to_string()),
            |b| b.id.to_string(),
            |b| b.name.clone(),
        ),
        sorts: ProductSort::ALL
            .into_iter()
            .map(|s| FacetOption {
                value: s.as_param().to_string(),
                label: s.label().to_string(),
                selected: s == query.sort,
            })
            .collect(),
        search: query.search.clone().unwrap_or_default(),
        price: PriceFilterView {
            floor: slider.floor(),
            ceiling: slider.ceiling(),
            min: slider.min(),
            max: slider.max(),
            narrowed: slider.is_narrowed(),
        },
        pager,
        has_filters: query.has_filters(),
        error,
    }
}

// =============================================================================
// Detail
// =============================================================================

/// Requested attribute values and reviews page from the raw query string, in
/// the order the pairs appear.
fn parse_detail_query(raw: Option<&str>) -> (Vec<AttributeValue>, u32) {
    let mut selection = Vec::new();
    let mut reviews_page = 1;
    for (name, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        if name == "reviews_page" {
            reviews_page = value.parse().unwrap_or(1).max(1);
        } else if !value.trim().is_empty() {
            selection.push(AttributeValue {
                name: name.into_owned(),
                value: value.trim().to_string(),
            });
        }
    }
    (selection, reviews_page)
}

/// Requested values laid over the default selection, keeping the default's
/// attribute order.
fn merge_selection(
    mut base: Vec<AttributeValue>,
    requested: Vec<AttributeValue>,
) -> Vec<AttributeValue> {
    for wanted in requested {
        match base
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(&wanted.name))
        {
            Some(existing) => existing.value = wanted.value,
            None => base.push(wanted),
        }
    }
    base
}

/// Selection for the product page: the default selection with the requested
/// values laid over it. Keys that are not options of the product (tracking
/// parameters and the like) are dropped.
fn product_selection(
    variants: &[Variant],
    requested: Vec<AttributeValue>,
) -> Vec<AttributeValue> {
    let requested = requested
        .into_iter()
        .filter(|a| variant::names_option(variants, &a.name))
        .collect();
    merge_selection(variant::default_selection(variants), requested)
}

fn selection_url(product: ProductId, selection: &[AttributeValue]) -> String {
    if selection.is_empty() {
        return format!("/products/{product}");
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(selection.iter().map(|a| (a.name.as_str(), a.value.as_str())))
        .finish();
    format!("/products/{product}?{encoded}")
}

/// One value button in an option group.
#[derive(Clone)]
pub struct OptionValueView {
    pub value: String,
    pub href: String,
    pub selected: bool,
    pub available: bool,
}

/// One attribute (color, size, ...) with its values.
#[derive(Clone)]
pub struct OptionGroupView {
    pub name: String,
    pub values: Vec<OptionValueView>,
}

fn option_group_views(
    product: ProductId,
    groups: Vec<OptionGroup>,
    selection: &[AttributeValue],
) -> Vec<OptionGroupView> {
    groups
        .into_iter()
        .map(|group| {
            let values = group
                .values
                .into_iter()
                .map(|v| {
                    let picked = merge_selection(
                        selection.to_vec(),
                        vec![AttributeValue {
                            name: group.name.clone(),
                            value: v.value.clone(),
                        }],
                    );
                    OptionValueView {
                        href: selection_url(product, &picked),
                        value: v.value,
                        selected: v.selected,
                        available: v.available,
                    }
                })
                .collect();
            OptionGroupView {
                name: group.name,
                values,
            }
        })
        .collect()
}

/// A published review.
#[derive(Clone)]
pub struct ReviewView {
    pub rating: u8,
    pub title: String,
    pub body: String,
    pub author: String,
    pub date: String,
    pub images: Vec<String>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            rating: review.rating,
            title: review.title.clone(),
            body: review.body.clone(),
            author: review
                .author_name
                .clone()
                .unwrap_or_else(|| "Verified buyer".to_string()),
            date: views::format_date(review.created_at),
            images: review.images.clone(),
        }
    }
}

/// Variant for the selection. With nothing selected and no single match,
/// the first in-stock variant is offered.
fn chosen_variant<'a>(
    product: &'a Product,
    selection: &[AttributeValue],
) -> std::result::Result<&'a Variant, VariantError> {
    match variant::resolve(&product.variants, selection) {
        Err(VariantError::CombinationNotAvailable) if selection.is_empty() => product
            .variants
            .iter()
            .find(|v| v.in_stock())
            .or_else(|| product.variants.first())
            .ok_or(VariantError::NoVariants),
        other => other.map(|resolved| resolved.variant),
    }
}

/// What the buy box offers for the current selection.
#[derive(Clone)]
pub struct BuyBox {
    pub variant_id: Option<String>,
    pub variant_label: Option<String>,
    pub price: String,
    pub compare_at: Option<String>,
    pub discount_percent: Option<u32>,
    pub stock_label: String,
    pub stock_class: &'static str,
    pub max_quantity: i64,
    pub can_add: bool,
    pub message: Option<String>,
}

impl BuyBox {
    fn for_selection(product: &Product, shop: &Shop, selection: &[AttributeValue]) -> Self {
        let stock = product.stock_status();
        let base = Self {
            variant_id: None,
            variant_label: None,
            price: shop.format(product.effective_price()),
            compare_at: product.compare_at_price().map(|p| shop.format(p)),
            discount_percent: product.discount_percent(),
            stock_label: stock.label(),
            stock_class: stock.badge_class(),
            max_quantity: product.total_stock(),
            can_add: stock.is_available(),
            message: None,
        };

        match chosen_variant(product, selection) {
            Ok(v) => {
                let price = product.variant_price(v);
                let status = StockStatus::from_quantity(
                    v.stock_qty,
                    product
                        .low_stock_threshold
                        .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
                );
                Self {
                    variant_id: Some(v.id.to_string()),
                    variant_label: Some(v.label()),
                    price: shop.format(price),
                    compare_at: product.variant_compare_at(v).map(|c| shop.format(c)),
                    discount_percent: product.variant_discount_percent(v),
                    stock_label: status.label(),
                    stock_class: status.badge_class(),
                    max_quantity: v.stock_qty.max(0),
                    can_add: v.in_stock(),
                    ..base
                }
            }
            Err(VariantError::NoVariants) => base,
            Err(e @ VariantError::CombinationNotAvailable) => Self {
                stock_label: "Unavailable".to_string(),
                stock_class: "bg-gray-100 text-gray-600",
                can_add: false,
                message: Some(e.to_string()),
                ..base
            },
        }
    }
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: Page,
    pub id: String,
    pub name: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub images: Vec<ProductImage>,
    pub buy: BuyBox,
    pub options: Vec<OptionGroupView>,
    pub rating: Option<String>,
    pub reviews: Vec<ReviewView>,
    pub reviews_pager: Pager,
    pub can_review: bool,
}

/// Display a product with the selected variant.
#[instrument(skip(state, shop, page, raw), fields(shop = %shop.slug))]
pub async fn show(
    State(state): State<AppState>,
    CurrentShop(shop): CurrentShop,
    page: Page,
    Path(id): Path<ProductId>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse> {
    let (requested, reviews_page) = parse_detail_query(raw.as_deref());

    let (product, reviews) = tokio::join!(
        state.backend().product(shop.id, id),
        state.backend().product_reviews(shop.id, id, reviews_page),
    );
    let product = product.map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound(format!("product {id}"))
        } else {
            AppError::Backend(e)
        }
    })?;
    let reviews = reviews.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch reviews");
        bazaar_backend::Paginated::empty()
    });

    let selection = product_selection(&product.variants, requested);
    let buy = BuyBox::for_selection(&product, &shop, &selection);
    let options = option_group_views(
        product.id,
        variant::option_groups(&product.variants, &selection),
        &selection,
    );

    // Variant image first when the selection has one.
    let mut images = product.images.clone();
    if let Ok(chosen) = chosen_variant(&product, &selection)
        && let Some(image) = &chosen.image
    {
        images.retain(|i| i.url != image.url);
        images.insert(0, image.clone());
    }

    let product_url = selection_url(product.id, &selection);
    let separator = if selection.is_empty() { '?' } else { '&' };
    let reviews_pager = Pager::new(&reviews.pagination(10), |n| {
        format!("{product_url}{separator}reviews_page={n}#reviews")
    });

    Ok(ProductShowTemplate {
        can_review: page.signed_in(),
        page,
        id: product.id.to_string(),
        name: product.name.clone(),
        short_description: product.short_description.clone(),
        description: product.description.clone(),
        images,
        buy,
        options,
        rating: product
            .rating
            .filter(|r| r.count > 0)
            .map(|r| format!("{:.1} out of 5 ({} reviews)", r.average, r.count)),
        reviews: reviews.items.iter().map(ReviewView::from).collect(),
        reviews_pager,
    })
}

// =============================================================================
// Reviews
// =============================================================================

/// Review form data. Image links are one per line.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub images: String,
}

impl ReviewForm {
    fn draft(&self) -> ReviewDraft {
        ReviewDraft {
            rating: self.rating.trim().parse().unwrap_or(0),
            title: self.title.clone(),
            body: self.body.clone(),
            images: self.images.lines().map(String::from).collect(),
        }
    }
}

/// Submit a review after checking the shopper received the product.
#[instrument(skip(state, shop, session, customer, form), fields(shop = %shop.slug))]
pub async fn submit_review(
    State(state): State<AppState>,
    CurrentShop(shop): CurrentShop,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let back = Redirect::to(&format!("/products/{id}#reviews"));
    let product = state.backend().product(shop.id, id).await?;

    let order_id = match state
        .backend()
        .check_review_eligibility(customer.token(), &product)
        .await
    {
        Ok(order_id) => order_id,
        Err(EligibilityError::Ineligible(e)) => {
            flash(&session, e.to_string()).await;
            return Ok(back.into_response());
        }
        Err(EligibilityError::Api(e)) => return Err(e.into()),
    };

    let submission = match form.draft().validate(order_id) {
        Ok(submission) => submission,
        Err(e) => {
            flash(&session, e.to_string()).await;
            return Ok(back.into_response());
        }
    };

    match state
        .backend()
        .submit_review(customer.token(), shop.id, &product, &submission)
        .await
    {
        Ok(()) => {
            tracing::info!(order = %order_id, "Review submitted");
            flash(
                &session,
                "Thanks for your review! It will appear once it has been approved.",
            )
            .await;
        }
        Err(bazaar_backend::ApiError::Validation(message)) => flash(&session, message).await,
        Err(e) => return Err(e.into()),
    }
    Ok(back.into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn attr(name: &str, value: &str) -> AttributeValue {
        AttributeValue {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_detail_query_keeps_order_and_reads_reviews_page() {
        let (selection, reviews_page) =
            parse_detail_query(Some("size=M&reviews_page=3&color=Blue&fit="));
        assert_eq!(selection, vec![attr("size", "M"), attr("color", "Blue")]);
        assert_eq!(reviews_page, 3);
    }

    #[test]
    fn test_merge_selection_overrides_in_place() {
        let merged = merge_selection(
            vec![attr("color", "Red"), attr("size", "S")],
            vec![attr("Size", "M"), attr("fit", "Slim")],
        );
        assert_eq!(
            merged,
            vec![attr("color", "Red"), attr("size", "M"), attr("fit", "Slim")]
        );
    }

    fn shop() -> Shop {
        serde_json::from_value(serde_json::json!({
            "id": 1, "slug": "acme", "name": "Acme"
        }))
        .unwrap()
    }

    fn sku_only_tee() -> Product {
        serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "Tee",
            "price": "20.00",
            "variants": [
                {"id": 31, "sku": "TEE-REDCOL-SSIZ", "stock_qty": 4},
                {"id": 32, "sku": "TEE-BLUCOL-MSIZ", "stock_qty": 0}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_tracking_parameters_do_not_join_the_selection() {
        let product = sku_only_tee();
        let (requested, _) =
            parse_detail_query(Some("color=Blue&size=M&utm_source=newsletter"));
        let selection = product_selection(&product.variants, requested);
        assert_eq!(selection, vec![attr("color", "Blue"), attr("size", "M")]);

        let buy = BuyBox::for_selection(&product, &shop(), &selection);
        assert_eq!(buy.variant_id.as_deref(), Some("32"));
        assert_eq!(buy.message, None);
    }

    #[test]
    fn test_buy_box_discount_follows_the_variant() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 4,
            "name": "Hoodie",
            "price": "20.00",
            "special_price": "10.00",
            "variants": [
                {"id": 41, "sku": "HOO-XLSIZ", "price": "40.00", "stock_qty": 2}
            ]
        }))
        .unwrap();

        let buy = BuyBox::for_selection(&product, &shop(), &[]);
        assert_eq!(buy.variant_id.as_deref(), Some("41"));
        assert_eq!(buy.compare_at, None);
        assert_eq!(buy.discount_percent, None);
    }

    #[test]
    fn test_review_form_without_rating_reaches_validation() {
        let form: ReviewForm = serde_json::from_value(serde_json::json!({
            "title": "Great", "body": "Fits well"
        }))
        .unwrap();
        assert_eq!(
            form.draft().validate(bazaar_core::OrderId::new(7)),
            Err(bazaar_core::review::ReviewError::InvalidRating)
        );
    }

    #[test]
    fn test_listing_url_keeps_filters() {
        let query = ProductQuery {
            category: Some("4".parse().unwrap()),
            search: Some("wool hat".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(listing_url(&query), "/products?category=4&q=wool+hat");
        assert_eq!(
            listing_url(&query.with_page(2)),
            "/products?page=2&category=4&q=wool+hat"
        );
        assert_eq!(listing_url(&ProductQuery::default()), "/products");
    }

    #[test]
    fn test_listing_params_drop_malformed_values() {
        let params = ListingParams {
            page: Some("abc".to_string()),
            category: Some("x".to_string()),
            min_price: Some("20".to_string()),
            max_price: Some("10".to_string()),
            ..ListingParams::default()
        };
        let slider = PriceRangeSlider::with_selection(0, 100, Some(20), Some(10));
        let query = params.to_query(&slider);
        assert_eq!(query.page, 1);
        assert_eq!(query.category, None);
        assert!(query.min_price.unwrap() < query.max_price.unwrap());
    }

    #[test]
    fn test_buy_box_reports_unavailable_combination() {
        let (shop, product) = (shop(), sku_only_tee());

        let selection = [attr("color", "Blue"), attr("size", "M")];
        let found = BuyBox::for_selection(&product, &shop, &selection);
        assert_eq!(found.variant_id.as_deref(), Some("32"));
        assert!(!found.can_add);

        let missing = BuyBox::for_selection(&product, &shop, &[attr("color", "Green")]);
        assert_eq!(
            missing.message.as_deref(),
            Some("This combination is not available")
        );
        assert!(!missing.can_add);
    }
}
