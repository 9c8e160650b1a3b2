use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminLocation::Table)
                    .if_not_exists()
                    .col(string_len(AdminLocation::Id, 64).primary_key())
                    .col(string_len(AdminLocation::Name, 200).not_null())
                    .col(string_len(AdminLocation::Address, 300).not_null())
                    .col(string_len(AdminLocation::Category, 16).not_null())
                    .col(double(AdminLocation::Lat).not_null())
                    .col(double(AdminLocation::Lng).not_null())
                    .col(json_binary(AdminLocation::Aliases).not_null())
                    .col(string_null(AdminLocation::Icon))
                    .col(integer(AdminLocation::SortOrder).not_null())
                    .to_owned(),
            )
            .await?;

        // Seed curated pickup / dropoff points, listed ahead of external results
        let insert = Query::insert()
            .into_table(AdminLocation::Table)
            .columns([
                AdminLocation::Id,
                AdminLocation::Name,
                AdminLocation::Address,
                AdminLocation::Category,
                AdminLocation::Lat,
                AdminLocation::Lng,
                AdminLocation::Aliases,
                AdminLocation::Icon,
                AdminLocation::SortOrder,
            ])
            .values_panic([
                "lax".into(),
                "Los Angeles International Airport".into(),
                "1 World Way, Los Angeles, CA 90045".into(),
                "airport".into(),
                (33.9416).into(),
                (-118.4085).into(),
                aliases(r#"["LAX", "Los Angeles Airport"]"#),
                "✈".into(),
                1.into(),
            ])
            .values_panic([
                "bur".into(),
                "Hollywood Burbank Airport".into(),
                "2627 N Hollywood Way, Burbank, CA 91505".into(),
                "airport".into(),
                (34.1975).into(),
                (-118.3585).into(),
                aliases(r#"["BUR", "Bob Hope Airport"]"#),
                "✈".into(),
                2.into(),
            ])
            .values_panic([
                "sna".into(),
                "John Wayne Airport".into(),
                "18601 Airport Way, Santa Ana, CA 92707".into(),
                "airport".into(),
                (33.6762).into(),
                (-117.8675).into(),
                aliases(r#"["SNA", "Orange County Airport"]"#),
                "✈".into(),
                3.into(),
            ])
            .values_panic([
                "lgb".into(),
                "Long Beach Airport".into(),
                "4100 Donald Douglas Dr, Long Beach, CA 90808".into(),
                "airport".into(),
                (33.8177).into(),
                (-118.1516).into(),
                aliases(r#"["LGB"]"#),
                "✈".into(),
                4.into(),
            ])
            .values_panic([
                "beverly-hills-hotel".into(),
                "The Beverly Hills Hotel".into(),
                "9641 Sunset Blvd, Beverly Hills, CA 90210".into(),
                "hotel".into(),
                (34.0816).into(),
                (-118.4135).into(),
                aliases(r#"["Pink Palace"]"#),
                "🏨".into(),
                5.into(),
            ])
            .values_panic([
                "ritz-carlton-la".into(),
                "The Ritz-Carlton, Los Angeles".into(),
                "900 W Olympic Blvd, Los Angeles, CA 90015".into(),
                "hotel".into(),
                (34.0453).into(),
                (-118.2670).into(),
                aliases(r#"["Ritz LA Live"]"#),
                "🏨".into(),
                6.into(),
            ])
            .values_panic([
                "sofi-stadium".into(),
                "SoFi Stadium".into(),
                "1001 Stadium Dr, Inglewood, CA 90301".into(),
                "venue".into(),
                (33.9535).into(),
                (-118.3392).into(),
                aliases(r#"["Hollywood Park"]"#),
                "🏟".into(),
                7.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminLocation::Table).to_owned())
            .await
    }
}

/// Alias list literal as a jsonb expression.
fn aliases(list: &str) -> SimpleExpr {
    Expr::val(list).cast_as(Alias::new("jsonb"))
}

#[derive(DeriveIden)]
pub enum AdminLocation {
    Table,
    Id,
    Name,
    Address,
    Category,
    Lat,
    Lng,
    Aliases,
    Icon,
    SortOrder,
}
