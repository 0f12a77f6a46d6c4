use super::models::{CatalogEntry, Plan, Service, PLANS_FIELD, TYPE_FIELD};
use crate::features::subscriptions::decode::decode_price_map;
use crate::features::subscriptions::validation::{validate_plan_name, validate_price, validate_service_name};
use crate::shared::config::SERVICES_COLLECTION;
use crate::shared::document_store::{DocumentStore, FieldPath};
use crate::shared::errors::{AppError, AppResult};
use futures::future::join_all;
use log::{info, warn};
use serde_json::Value;

/// サービス一覧を取得する
///
/// `Type` が文字列でないサービスは読み飛ばす。
pub async fn list_services<S>(store: &S) -> AppResult<Vec<Service>>
where
    S: DocumentStore + ?Sized,
{
    let documents = store.list_documents(SERVICES_COLLECTION).await?;

    let services: Vec<Service> = documents
        .into_iter()
        .filter_map(|(name, document)| {
            match document.get(TYPE_FIELD).and_then(Value::as_str) {
                Some(service_type) => Some(Service {
                    name,
                    service_type: service_type.to_string(),
                }),
                None => {
                    warn!("種別が不正なサービスを読み飛ばします: service={name}");
                    None
                }
            }
        })
        .collect();

    info!("サービス一覧取得成功: count={}", services.len());
    Ok(services)
}

/// サービスのプラン一覧を取得する
///
/// # 戻り値
/// 価格の安い順（同額はプラン名順）のプラン一覧。
/// サービスが存在しない場合は`DocumentNotFound`
pub async fn get_plans<S>(store: &S, service_name: &str) -> AppResult<Vec<Plan>>
where
    S: DocumentStore + ?Sized,
{
    let document = store
        .get_document(SERVICES_COLLECTION, service_name)
        .await?
        .ok_or_else(|| AppError::document_not_found(SERVICES_COLLECTION, service_name))?;

    let Some(plans_map) = document.get(PLANS_FIELD) else {
        // プラン未登録のサービス
        return Ok(Vec::new());
    };
    let plans_map = plans_map
        .as_object()
        .ok_or_else(|| AppError::malformed_field(format!("{service_name} の {PLANS_FIELD} がマップではありません")))?;

    let mut plans: Vec<Plan> = decode_price_map(plans_map)
        .into_iter()
        .filter(|(_, price)| *price >= 0.0)
        .map(|(name, price)| Plan { name, price })
        .collect();
    plans.sort_by(|a, b| a.price.total_cmp(&b.price).then_with(|| a.name.cmp(&b.name)));

    Ok(plans)
}

/// サービス一覧と各サービスのプランをまとめて取得する
///
/// プラン取得に失敗したサービスは一覧から除く。
pub async fn load_catalog<S>(store: &S) -> AppResult<Vec<CatalogEntry>>
where
    S: DocumentStore + ?Sized,
{
    let services = list_services(store).await?;
    let plan_results = join_all(services.iter().map(|s| get_plans(store, &s.name))).await;

    let entries = services
        .into_iter()
        .zip(plan_results)
        .filter_map(|(service, plans)| match plans {
            Ok(plans) => Some(CatalogEntry { service, plans }),
            Err(e) => {
                warn!("プラン取得に失敗したため除外します: service={}, error={e}", service.name);
                None
            }
        })
        .collect();

    Ok(entries)
}

/// 独自のサービスをカタログに追加する
///
/// 同名のサービスが既にある場合は種別を上書きする（プランは保持）。
pub async fn add_custom_service<S>(store: &S, name: &str, service_type: &str) -> AppResult<Service>
where
    S: DocumentStore + ?Sized,
{
    validate_service_name(name)?;
    if service_type.trim().is_empty() {
        return Err(AppError::validation("種別を入力してください"));
    }

    store
        .set_field(
            SERVICES_COLLECTION,
            name,
            &FieldPath::new([TYPE_FIELD]),
            Value::from(service_type),
        )
        .await?;

    info!("独自サービスを追加しました: service={name}, type={service_type}");
    Ok(Service {
        name: name.to_string(),
        service_type: service_type.to_string(),
    })
}

/// 既存サービスに独自のプランを追加する
pub async fn add_custom_plan<S>(store: &S, service_name: &str, plan: &Plan) -> AppResult<()>
where
    S: DocumentStore + ?Sized,
{
    validate_plan_name(&plan.name)?;
    validate_price(plan.price)?;

    if store
        .get_document(SERVICES_COLLECTION, service_name)
        .await?
        .is_none()
    {
        return Err(AppError::document_not_found(SERVICES_COLLECTION, service_name));
    }

    store
        .set_field(
            SERVICES_COLLECTION,
            service_name,
            &FieldPath::new([PLANS_FIELD, plan.name.as_str()]),
            Value::from(plan.price),
        )
        .await?;

    info!("独自プランを追加しました: service={service_name}, plan={}", plan.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::document_store::InMemoryDocumentStore;
    use serde_json::json;

    fn seeded_store() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        store
            .seed_document(
                "Services",
                "Netflix",
                json!({"Type": "Video", "Plans": {"Premium": 15.99, "Basic": 7.99, "Standard": "n/a"}}),
            )
            .unwrap();
        store
            .seed_document("Services", "Spotify", json!({"Type": "Music"}))
            .unwrap();
        store
            .seed_document("Services", "Broken", json!({"Type": 3}))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_list_services_skips_invalid_type() {
        let store = seeded_store();
        let services = list_services(&store).await.unwrap();
        let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Netflix", "Spotify"]);
    }

    #[tokio::test]
    async fn test_get_plans_sorted_by_price() {
        let store = seeded_store();
        let plans = get_plans(&store, "Netflix").await.unwrap();
        assert_eq!(
            plans,
            vec![
                Plan { name: "Basic".to_string(), price: 7.99 },
                Plan { name: "Premium".to_string(), price: 15.99 },
            ]
        );

        assert!(get_plans(&store, "Spotify").await.unwrap().is_empty());
        assert!(matches!(
            get_plans(&store, "Hulu").await,
            Err(AppError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_load_catalog() {
        let store = seeded_store();
        let catalog = load_catalog(&store).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].plans.len(), 2);
    }

    #[tokio::test]
    async fn test_add_custom_service_and_plan() {
        let store = seeded_store();
        let service = add_custom_service(&store, "LocalGym", "Fitness").await.unwrap();
        assert_eq!(service.service_type, "Fitness");

        add_custom_plan(&store, "LocalGym", &Plan::new("Monthly", 30.0).unwrap())
            .await
            .unwrap();
        let plans = get_plans(&store, "LocalGym").await.unwrap();
        assert_eq!(plans, vec![Plan { name: "Monthly".to_string(), price: 30.0 }]);
    }

    #[tokio::test]
    async fn test_add_custom_plan_requires_service() {
        let store = seeded_store();
        let result = add_custom_plan(&store, "Unknown", &Plan::new("X", 1.0).unwrap()).await;
        assert!(matches!(result, Err(AppError::DocumentNotFound(_))));

        assert!(add_custom_service(&store, "", "Video").await.is_err());
        assert!(add_custom_service(&store, "Hulu", " ").await.is_err());
    }
}
