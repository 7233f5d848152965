//! Seed the menu with sample dishes.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use sage_kitchen_backend::pg::{CatalogRepository, RepositoryError};
use sage_kitchen_core::Price;
use sage_kitchen_core::catalog::{
    Category, NewProduct, PLACEHOLDER_IMAGE, ProductError, ProductFields,
};
use sage_kitchen_core::types::PriceError;

use super::{CommandError, connect};

/// Errors from seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error(transparent)]
    Product(#[from] ProductError),
}

struct SampleDish {
    name: &'static str,
    description: &'static str,
    price: Decimal,
    category: Category,
    is_promoted: bool,
}

const SAMPLE_DISHES: [SampleDish; 8] = [
    SampleDish {
        name: "Margherita Pizza",
        description: "San Marzano tomato, fior di latte, basil",
        price: dec!(12.50),
        category: Category::Italian,
        is_promoted: true,
    },
    SampleDish {
        name: "Lasagna al Forno",
        description: "Slow-cooked ragù, béchamel, parmesan",
        price: dec!(14.00),
        category: Category::Italian,
        is_promoted: false,
    },
    SampleDish {
        name: "Smash Burger",
        description: "Two beef patties, cheddar, pickles, house sauce",
        price: dec!(11.00),
        category: Category::American,
        is_promoted: false,
    },
    SampleDish {
        name: "Buttermilk Fried Chicken",
        description: "Crispy thighs with honey hot sauce and slaw",
        price: dec!(13.50),
        category: Category::American,
        is_promoted: false,
    },
    SampleDish {
        name: "Tonkotsu Ramen",
        description: "Pork broth, chashu, ajitama egg, nori",
        price: dec!(15.00),
        category: Category::Japanese,
        is_promoted: true,
    },
    SampleDish {
        name: "Salmon Nigiri Set",
        description: "Eight pieces with pickled ginger and wasabi",
        price: dec!(16.50),
        category: Category::Japanese,
        is_promoted: false,
    },
    SampleDish {
        name: "Quinoa Power Bowl",
        description: "Quinoa, roasted squash, kale, tahini dressing",
        price: dec!(10.50),
        category: Category::Healthy,
        is_promoted: false,
    },
    SampleDish {
        name: "Greek Salad",
        description: "Tomato, cucumber, olives, feta, oregano",
        price: dec!(9.00),
        category: Category::Healthy,
        is_promoted: false,
    },
];

fn sample_products() -> Result<Vec<NewProduct>, SeedError> {
    SAMPLE_DISHES
        .iter()
        .map(|dish| {
            let fields = ProductFields {
                name: dish.name.to_owned(),
                description: Some(dish.description.to_owned()),
                price: Price::try_new(dish.price)?,
                category: dish.category,
                is_promoted: dish.is_promoted,
                discount_percentage: None,
            };
            Ok(NewProduct::new(fields, vec![PLACEHOLDER_IMAGE.to_owned()])?)
        })
        .collect()
}

/// Insert the sample dishes. An existing menu is left alone unless `force`.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run(force: bool) -> Result<(), SeedError> {
    let pool = connect().await?;
    let catalog = CatalogRepository::new(&pool);

    let existing = catalog.count().await?;
    if existing > 0 && !force {
        tracing::info!(existing, "Menu already has products, skipping (use --force to seed anyway)");
        return Ok(());
    }

    let products = sample_products()?;
    for product in &products {
        let created = catalog.create(product).await?;
        tracing::info!(product_id = %created.id, "Seeded {}", created.name);
    }
    tracing::info!(count = products.len(), "Seeding complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_samples_cover_every_category() {
        let products = sample_products();
        assert!(products.is_ok());
        let categories: HashSet<Category> = products
            .unwrap_or_default()
            .iter()
            .map(|p| p.fields.category)
            .collect();
        assert_eq!(categories.len(), Category::ALL.len());
    }
}
