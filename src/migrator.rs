use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250105_000001_create_apparel_products_table::Migration),
            Box::new(m20250105_000002_create_orders_table::Migration),
        ]
    }
}

mod m20250105_000001_create_apparel_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250105_000001_create_apparel_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ApparelProducts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ApparelProducts::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ApparelProducts::Title)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ApparelProducts::Description)
                                .text()
                                .not_null()
                                .default(""),
                        )
                        .col(ColumnDef::new(ApparelProducts::Image).string_len(255).null())
                        .col(
                            ColumnDef::new(ApparelProducts::Category)
                                .string_len(10)
                                .not_null()
                                .default("MALE"),
                        )
                        .col(ColumnDef::new(ApparelProducts::Sizes).json().not_null())
                        .col(
                            ColumnDef::new(ApparelProducts::Price)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ApparelProducts::Status)
                                .string_len(20)
                                .not_null()
                                .default("AVAILABLE"),
                        )
                        .col(
                            ColumnDef::new(ApparelProducts::WhatsappMessage)
                                .text()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ApparelProducts::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ApparelProducts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ApparelProducts::UpdatedAt)
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
                        .name("idx_apparel_products_active_category")
                        .table(ApparelProducts::Table)
                        .col(ApparelProducts::IsActive)
                        .col(ApparelProducts::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_apparel_products_created_at")
                        .table(ApparelProducts::Table)
                        .col(ApparelProducts::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ApparelProducts::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum ApparelProducts {
        Table,
        Id,
        Title,
        Description,
        Image,
        Category,
        Sizes,
        Price,
        Status,
        WhatsappMessage,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250105_000002_create_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250105_000002_create_orders_table"
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
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Orders::OrderId)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::ProductTitle).string_len(200).not_null())
                        .col(ColumnDef::new(Orders::Size).string_len(10).not_null())
                        .col(
                            ColumnDef::new(Orders::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(Orders::Price).decimal_len(10, 2).not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::FullName).string_len(200).not_null())
                        .col(ColumnDef::new(Orders::Mobile).string_len(15).not_null())
                        .col(
                            ColumnDef::new(Orders::CountryCode)
                                .string_len(5)
                                .not_null()
                                .default("+91"),
                        )
                        .col(ColumnDef::new(Orders::HouseFlatNo).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Orders::StreetLocality)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::City).string_len(100).not_null())
                        .col(ColumnDef::new(Orders::State).string_len(100).not_null())
                        .col(ColumnDef::new(Orders::PinCode).string_len(10).not_null())
                        .col(
                            ColumnDef::new(Orders::PaymentMode)
                                .string_len(10)
                                .not_null()
                                .default("COD"),
                        )
                        .col(
                            ColumnDef::new(Orders::PaymentStatus)
                                .string_len(20)
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(ColumnDef::new(Orders::RazorpayOrderId).string_len(100).null())
                        .col(
                            ColumnDef::new(Orders::RazorpayPaymentId)
                                .string_len(100)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::RazorpaySignature)
                                .string_len(255)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::OrderStatus)
                                .string_len(20)
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(
                            ColumnDef::new(Orders::WhatsappMessageSid)
                                .string_len(100)
                                .null(),
                        )
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
                        .name("idx_orders_created_at")
                        .table(Orders::Table)
                        .col(Orders::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        OrderId,
        ProductTitle,
        Size,
        Quantity,
        Price,
        TotalAmount,
        FullName,
        Mobile,
        CountryCode,
        HouseFlatNo,
        StreetLocality,
        City,
        State,
        PinCode,
        PaymentMode,
        PaymentStatus,
        RazorpayOrderId,
        RazorpayPaymentId,
        RazorpaySignature,
        OrderStatus,
        WhatsappMessageSid,
        CreatedAt,
        UpdatedAt,
    }
}
