//! Embedded schema migrations.
//!
//! The same migrator runs against Postgres in production and against
//! `sqlite::memory:` in the integration tests, so the schema here is the
//! single source of truth for both.

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_crm_tables::Migration),
            Box::new(m20240101_000002_create_catalog_tables::Migration),
            Box::new(m20240101_000003_create_orders_tables::Migration),
            Box::new(m20240101_000004_create_warehouse_tables::Migration),
            Box::new(m20240101_000005_create_manufacturing_tables::Migration),
            Box::new(m20240101_000006_create_serial_number_tables::Migration),
            Box::new(m20240101_000007_create_shipping_tables::Migration),
            Box::new(m20240101_000008_create_invoices_table::Migration),
        ]
    }
}

mod m20240101_000001_create_crm_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_crm_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Companies::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Companies::Name).string().not_null())
                        .col(ColumnDef::new(Companies::TaxId).string().null())
                        .col(ColumnDef::new(Companies::ExternalId).string().null())
                        .col(ColumnDef::new(Companies::Source).string().null())
                        .col(
                            ColumnDef::new(Companies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Companies::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Clients::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Clients::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Clients::Name).string().not_null())
                        .col(ColumnDef::new(Clients::Email).string().null())
                        .col(ColumnDef::new(Clients::Phone).string().null())
                        .col(ColumnDef::new(Clients::CompanyId).big_integer().null())
                        .col(ColumnDef::new(Clients::ExternalId).string().null())
                        .col(ColumnDef::new(Clients::Source).string().null())
                        .col(
                            ColumnDef::new(Clients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Clients::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_clients_company_id")
                                .from(Clients::Table, Clients::CompanyId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // Sync upsert key
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_clients_source_external_id")
                        .table(Clients::Table)
                        .col(Clients::Source)
                        .col(Clients::ExternalId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ClientContacts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ClientContacts::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ClientContacts::ClientId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ClientContacts::Name).string().not_null())
                        .col(ColumnDef::new(ClientContacts::Email).string().null())
                        .col(ColumnDef::new(ClientContacts::Phone).string().null())
                        .col(ColumnDef::new(ClientContacts::Position).string().null())
                        .col(ColumnDef::new(ClientContacts::ExternalId).string().null())
                        .col(ColumnDef::new(ClientContacts::Source).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_client_contacts_client_id")
                                .from(ClientContacts::Table, ClientContacts::ClientId)
                                .to(Clients::Table, Clients::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ClientContacts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Clients::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Companies {
        Table,
        Id,
        Name,
        TaxId,
        ExternalId,
        Source,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Clients {
        Table,
        Id,
        Name,
        Email,
        Phone,
        CompanyId,
        ExternalId,
        Source,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ClientContacts {
        Table,
        Id,
        ClientId,
        Name,
        Email,
        Phone,
        Position,
        ExternalId,
        Source,
    }
}

mod m20240101_000002_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(
                            ColumnDef::new(Categories::SerialNumberingEnabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Categories::SerialTemplate).string().null())
                        .col(
                            ColumnDef::new(Categories::SerialCounter)
                                .big_integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Sku).string().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::CategoryId).big_integer().null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::IsManufactured)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_category_id")
                                .from(Products::Table, Products::CategoryId)
                                .to(Categories::Table, Categories::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_sku")
                        .table(Products::Table)
                        .col(Products::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Recipes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Recipes::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Recipes::ProductId).big_integer().not_null())
                        .col(ColumnDef::new(Recipes::Name).string().not_null())
                        .col(
                            ColumnDef::new(Recipes::OutputQuantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Recipes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_recipes_product_id")
                                .from(Recipes::Table, Recipes::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Recipes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Categories {
        Table,
        Id,
        Name,
        SerialNumberingEnabled,
        SerialTemplate,
        SerialCounter,
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        Sku,
        Name,
        CategoryId,
        Price,
        IsManufactured,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Recipes {
        Table,
        Id,
        ProductId,
        Name,
        OutputQuantity,
        CreatedAt,
    }
}

mod m20240101_000003_create_orders_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_orders_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                        .col(ColumnDef::new(Orders::ClientId).big_integer().not_null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::PaymentType).string().not_null())
                        .col(
                            ColumnDef::new(Orders::PaidAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::PaidAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::ContractNumber).string().null())
                        .col(
                            ColumnDef::new(Orders::ProductionApproved)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::ProductionApprovedBy)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::ProductionApprovedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::DueDate).date().null())
                        .col(ColumnDef::new(Orders::ShipDate).date().null())
                        .col(ColumnDef::new(Orders::Notes).string().null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_order_number")
                        .table(Orders::Table)
                        .col(Orders::OrderNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_client_id")
                        .table(Orders::Table)
                        .col(Orders::ClientId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).big_integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::ShippedQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(OrderItems::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(OrderItems::TotalPrice).decimal().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        ClientId,
        Status,
        TotalAmount,
        PaymentType,
        PaidAmount,
        PaidAt,
        ContractNumber,
        ProductionApproved,
        ProductionApprovedBy,
        ProductionApprovedAt,
        DueDate,
        ShipDate,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        Quantity,
        ShippedQuantity,
        UnitPrice,
        TotalPrice,
    }
}

mod m20240101_000004_create_warehouse_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_warehouse_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Warehouses::Code).string().not_null())
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(
                            ColumnDef::new(Warehouses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_warehouses_code")
                        .table(Warehouses::Table)
                        .col(Warehouses::Code)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryLevels::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryLevels::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryLevels::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLevels::WarehouseId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLevels::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryLevels::MinStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryLevels::MaxStock).integer().null())
                        .col(
                            ColumnDef::new(InventoryLevels::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_levels_warehouse_id")
                                .from(InventoryLevels::Table, InventoryLevels::WarehouseId)
                                .to(Warehouses::Table, Warehouses::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // One row per (product, warehouse)
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_levels_product_warehouse")
                        .table(InventoryLevels::Table)
                        .col(InventoryLevels::ProductId)
                        .col(InventoryLevels::WarehouseId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryLevels::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Warehouses {
        Table,
        Id,
        Code,
        Name,
        CreatedAt,
    }

    #[derive(Iden)]
    enum InventoryLevels {
        Table,
        Id,
        ProductId,
        WarehouseId,
        Quantity,
        MinStock,
        MaxStock,
        UpdatedAt,
    }
}

mod m20240101_000005_create_manufacturing_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_manufacturing_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ManufacturingOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ManufacturingOrders::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::OrderNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::RecipeId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::PlannedQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::ProducedQuantity)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::WarehouseId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::SourceOrderId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::MaterialCost)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::LaborCost)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::OverheadCost)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::QualityRating)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(ManufacturingOrders::Notes).string().null())
                        .col(
                            ColumnDef::new(ManufacturingOrders::SerialNumbers)
                                .json()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::StartedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::CompletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_manufacturing_orders_source_order_id")
                        .table(ManufacturingOrders::Table)
                        .col(ManufacturingOrders::SourceOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ManufacturingSteps::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ManufacturingSteps::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingSteps::ManufacturingOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingSteps::Sequence)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ManufacturingSteps::Name).string().not_null())
                        .col(
                            ColumnDef::new(ManufacturingSteps::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingSteps::EstimatedDurationMinutes)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingSteps::AssignedWorker)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingSteps::StartedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ManufacturingSteps::CompletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_manufacturing_steps_order_id")
                                .from(
                                    ManufacturingSteps::Table,
                                    ManufacturingSteps::ManufacturingOrderId,
                                )
                                .to(ManufacturingOrders::Table, ManufacturingOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductionTasks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionTasks::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductionTasks::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTasks::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTasks::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTasks::Progress)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionTasks::StartDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTasks::EndDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTasks::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTasks::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionTasks::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ManufacturingSteps::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ManufacturingOrders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum ManufacturingOrders {
        Table,
        Id,
        OrderNumber,
        ProductId,
        RecipeId,
        PlannedQuantity,
        ProducedQuantity,
        Status,
        WarehouseId,
        SourceOrderId,
        MaterialCost,
        LaborCost,
        OverheadCost,
        QualityRating,
        Notes,
        SerialNumbers,
        StartedAt,
        CompletedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ManufacturingSteps {
        Table,
        Id,
        ManufacturingOrderId,
        Sequence,
        Name,
        Status,
        EstimatedDurationMinutes,
        AssignedWorker,
        StartedAt,
        CompletedAt,
    }

    #[derive(Iden)]
    enum ProductionTasks {
        Table,
        Id,
        ProductId,
        Quantity,
        Status,
        Progress,
        StartDate,
        EndDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_serial_number_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_serial_number_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SerialNumbers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SerialNumbers::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SerialNumbers::Serial).string().not_null())
                        .col(
                            ColumnDef::new(SerialNumbers::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SerialNumbers::Status).string().not_null())
                        .col(
                            ColumnDef::new(SerialNumbers::ManufacturingOrderId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(SerialNumbers::OrderId).big_integer().null())
                        .col(
                            ColumnDef::new(SerialNumbers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_serial_numbers_serial")
                        .table(SerialNumbers::Table)
                        .col(SerialNumbers::Serial)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(NumberingSettings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(NumberingSettings::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(NumberingSettings::CrossNumberingEnabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(NumberingSettings::GlobalTemplate)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NumberingSettings::GlobalCounter)
                                .big_integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            // Seed the single settings row; cross-numbering is off until an
            // operator turns it on.
            let seed = Query::insert()
                .into_table(NumberingSettings::Table)
                .columns([
                    NumberingSettings::CrossNumberingEnabled,
                    NumberingSettings::GlobalTemplate,
                    NumberingSettings::GlobalCounter,
                ])
                .values_panic([
                    false.into(),
                    "SN-{year}{month:2}-{counter:6}".into(),
                    1i64.into(),
                ])
                .to_owned();
            manager.exec_stmt(seed).await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(NumberingSettings::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SerialNumbers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum SerialNumbers {
        Table,
        Id,
        Serial,
        ProductId,
        Status,
        ManufacturingOrderId,
        OrderId,
        CreatedAt,
    }

    #[derive(Iden)]
    enum NumberingSettings {
        Table,
        Id,
        CrossNumberingEnabled,
        GlobalTemplate,
        GlobalCounter,
    }
}

mod m20240101_000007_create_shipping_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_shipping_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Shipments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Shipments::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Shipments::OrderId).big_integer().not_null())
                        .col(ColumnDef::new(Shipments::Status).string().not_null())
                        .col(ColumnDef::new(Shipments::Carrier).string().null())
                        .col(ColumnDef::new(Shipments::TrackingNumber).string().null())
                        .col(
                            ColumnDef::new(Shipments::ShippedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ShipmentItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShipmentItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ShipmentItems::ShipmentId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShipmentItems::OrderItemId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ShipmentItems::Quantity).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_shipment_items_shipment_id")
                                .from(ShipmentItems::Table, ShipmentItems::ShipmentId)
                                .to(Shipments::Table, Shipments::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ShipmentItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Shipments::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Shipments {
        Table,
        Id,
        OrderId,
        Status,
        Carrier,
        TrackingNumber,
        ShippedAt,
        CreatedAt,
    }

    #[derive(Iden)]
    enum ShipmentItems {
        Table,
        Id,
        ShipmentId,
        OrderItemId,
        Quantity,
    }
}

mod m20240101_000008_create_invoices_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_invoices_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Invoices::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Invoices::Number).string().not_null())
                        .col(ColumnDef::new(Invoices::ClientId).big_integer().not_null())
                        .col(ColumnDef::new(Invoices::OrderId).big_integer().null())
                        .col(ColumnDef::new(Invoices::Amount).decimal().not_null())
                        .col(ColumnDef::new(Invoices::Status).string().not_null())
                        .col(ColumnDef::new(Invoices::IssuedAt).date().null())
                        .col(ColumnDef::new(Invoices::ExternalId).string().null())
                        .col(ColumnDef::new(Invoices::Source).string().null())
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_number")
                        .table(Invoices::Table)
                        .col(Invoices::Number)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Invoices {
        Table,
        Id,
        Number,
        ClientId,
        OrderId,
        Amount,
        Status,
        IssuedAt,
        ExternalId,
        Source,
        CreatedAt,
        UpdatedAt,
    }
}
