use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_businesses_table::Migration),
            Box::new(m20250301_000003_create_business_photos_table::Migration),
            Box::new(m20250301_000004_create_menu_tables::Migration),
            Box::new(m20250301_000005_create_wifi_networks_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250301_000001_create_users_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::DisplayName).string().not_null())
                        .col(
                            ColumnDef::new(Users::Role)
                                .string_len(16)
                                .not_null()
                                .default("user"),
                        )
                        .col(ColumnDef::new(Users::BusinessId).big_integer().null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Users::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_business_id")
                        .table(Users::Table)
                        .col(Users::BusinessId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Email,
        PasswordHash,
        DisplayName,
        Role,
        BusinessId,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_businesses_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_businesses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Businesses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Businesses::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Businesses::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Businesses::Name).string().not_null())
                        .col(ColumnDef::new(Businesses::Description).text().null())
                        .col(ColumnDef::new(Businesses::Category).string().null())
                        .col(ColumnDef::new(Businesses::Location).string().null())
                        .col(ColumnDef::new(Businesses::Phone).string().null())
                        .col(ColumnDef::new(Businesses::Email).string().null())
                        .col(ColumnDef::new(Businesses::Website).string().null())
                        .col(ColumnDef::new(Businesses::Whatsapp).string().null())
                        .col(ColumnDef::new(Businesses::Instagram).string().null())
                        .col(ColumnDef::new(Businesses::Facebook).string().null())
                        .col(ColumnDef::new(Businesses::LogoUrl).string().null())
                        .col(ColumnDef::new(Businesses::CoverUrl).string().null())
                        .col(ColumnDef::new(Businesses::PrimaryColor).string().null())
                        .col(ColumnDef::new(Businesses::SecondaryColor).string().null())
                        .col(
                            ColumnDef::new(Businesses::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Businesses::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Businesses::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_businesses_category")
                        .table(Businesses::Table)
                        .col(Businesses::Category)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Businesses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Businesses {
        Table,
        Id,
        Username,
        Name,
        Description,
        Category,
        Location,
        Phone,
        Email,
        Website,
        Whatsapp,
        Instagram,
        Facebook,
        LogoUrl,
        CoverUrl,
        PrimaryColor,
        SecondaryColor,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000003_create_business_photos_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_business_photos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BusinessPhotos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BusinessPhotos::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(BusinessPhotos::BusinessId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BusinessPhotos::Url).string().not_null())
                        .col(
                            ColumnDef::new(BusinessPhotos::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BusinessPhotos::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_business_photos_business")
                                .from(BusinessPhotos::Table, BusinessPhotos::BusinessId)
                                .to(Businesses::Table, Businesses::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_business_photos_business_id")
                        .table(BusinessPhotos::Table)
                        .col(BusinessPhotos::BusinessId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BusinessPhotos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum BusinessPhotos {
        Table,
        Id,
        BusinessId,
        Url,
        Position,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Businesses {
        Table,
        Id,
    }
}

mod m20250301_000004_create_menu_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_menu_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Cascade deletes are orchestrated by the menu service inside a
            // transaction, so foreign keys here are plain references.
            manager
                .create_table(
                    Table::create()
                        .table(MenuCategories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuCategories::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(MenuCategories::BusinessId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuCategories::Name).string().not_null())
                        .col(ColumnDef::new(MenuCategories::ImageUrl).string().null())
                        .col(
                            ColumnDef::new(MenuCategories::DisplayOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MenuCategories::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(MenuCategories::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuCategories::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_menu_categories_business")
                                .from(MenuCategories::Table, MenuCategories::BusinessId)
                                .to(Businesses::Table, Businesses::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_menu_categories_business_id")
                        .table(MenuCategories::Table)
                        .col(MenuCategories::BusinessId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MenuSubcategories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuSubcategories::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(MenuSubcategories::CategoryId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuSubcategories::Name).string().not_null())
                        .col(
                            ColumnDef::new(MenuSubcategories::DisplayOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MenuSubcategories::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(MenuSubcategories::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MenuSubcategories::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_menu_subcategories_category")
                                .from(MenuSubcategories::Table, MenuSubcategories::CategoryId)
                                .to(MenuCategories::Table, MenuCategories::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_menu_subcategories_category_id")
                        .table(MenuSubcategories::Table)
                        .col(MenuSubcategories::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MenuItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(MenuItems::SubcategoryId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuItems::Name).string().not_null())
                        .col(ColumnDef::new(MenuItems::Description).text().null())
                        .col(
                            ColumnDef::new(MenuItems::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(MenuItems::ImageUrl).string().null())
                        .col(
                            ColumnDef::new(MenuItems::DisplayOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MenuItems::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(MenuItems::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(MenuItems::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_menu_items_subcategory")
                                .from(MenuItems::Table, MenuItems::SubcategoryId)
                                .to(MenuSubcategories::Table, MenuSubcategories::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_menu_items_subcategory_id")
                        .table(MenuItems::Table)
                        .col(MenuItems::SubcategoryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MenuItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MenuSubcategories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MenuCategories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MenuCategories {
        Table,
        Id,
        BusinessId,
        Name,
        ImageUrl,
        DisplayOrder,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum MenuSubcategories {
        Table,
        Id,
        CategoryId,
        Name,
        DisplayOrder,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum MenuItems {
        Table,
        Id,
        SubcategoryId,
        Name,
        Description,
        Price,
        ImageUrl,
        DisplayOrder,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Businesses {
        Table,
        Id,
    }
}

mod m20250301_000005_create_wifi_networks_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000005_create_wifi_networks_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WifiNetworks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WifiNetworks::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WifiNetworks::BusinessId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WifiNetworks::Ssid).string().not_null())
                        .col(ColumnDef::new(WifiNetworks::Password).string().null())
                        .col(
                            ColumnDef::new(WifiNetworks::SecurityType)
                                .string_len(8)
                                .not_null()
                                .default("wpa"),
                        )
                        .col(
                            ColumnDef::new(WifiNetworks::IsHidden)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(WifiNetworks::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WifiNetworks::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_wifi_networks_business")
                                .from(WifiNetworks::Table, WifiNetworks::BusinessId)
                                .to(Businesses::Table, Businesses::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_wifi_networks_business_id")
                        .table(WifiNetworks::Table)
                        .col(WifiNetworks::BusinessId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WifiNetworks::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum WifiNetworks {
        Table,
        Id,
        BusinessId,
        Ssid,
        Password,
        SecurityType,
        IsHidden,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Businesses {
        Table,
        Id,
    }
}
