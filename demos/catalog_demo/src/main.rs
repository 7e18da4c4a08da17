//! Walks the catalog through a create/relate/cascade cycle on disk.

use mediadb_catalog::relations::{MediaGenre, MediaGenreQueries, UserMedia, WatchStatus};
use mediadb_catalog::{Catalog, CatalogError, CatalogOptions, Media, Title};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mediadb_storage=debug,mediadb_core=debug".into()),
        )
        .init();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("demo.db");
    let catalog = Catalog::open(&path, CatalogOptions::new().file_mode(0o600))?;

    // Build a small graph: one show, two genres, one tracking user.
    let (show, genres) = catalog.update(|tx| {
        let show = catalog.media().create(
            tx,
            &mut Media {
                titles: vec![
                    Title::new("ja", "カウボーイビバップ"),
                    Title::new("en", "Cowboy Bebop"),
                ],
                synopsis: "Bounty hunters drift through the solar system.".into(),
                episode_count: Some(26),
                ..Default::default()
            },
        )?;

        let mut genre_ids = Vec::new();
        for name in ["space western", "jazz"] {
            let genre_id = catalog.genres().create(
                tx,
                &mut mediadb_catalog::Genre {
                    name: name.into(),
                    ..Default::default()
                },
            )?;
            catalog.media_genres().create(
                tx,
                &mut MediaGenre {
                    media_id: show,
                    genre_id,
                    ..Default::default()
                },
            )?;
            genre_ids.push(genre_id);
        }

        let user = catalog.users().create(
            tx,
            &mut mediadb_catalog::User {
                username: "spike".into(),
                email: "spike@example.com".into(),
                password_hash: "pbkdf2$29000$c2FsdA$aGFzaA".into(),
                ..Default::default()
            },
        )?;
        catalog.user_media().create(
            tx,
            &mut UserMedia {
                user_id: user,
                media_id: show,
                status: WatchStatus::Completed,
                score: Some(95),
                ..Default::default()
            },
        )?;

        Ok((show, genre_ids))
    })?;

    let tags = catalog.view(|tx| {
        Ok(catalog
            .media_genres()
            .get_by_media(tx, show, None, None)?
            .len())
    })?;
    info!(%show, tags, "graph created");

    // Deleting one genre cascades into its join records.
    catalog.update(|tx| Ok(catalog.genres().delete(tx, genres[0])?))?;

    let tags = catalog.view(|tx| {
        Ok(catalog
            .media_genres()
            .get_by_media(tx, show, None, None)?
            .len())
    })?;
    info!(tags, "after genre delete");

    let remaining: Result<usize, CatalogError> =
        catalog.view(|tx| Ok(catalog.user_media().get_all(tx, None, None)?.len()));
    info!(entries = remaining?, "user tracking entries intact");

    Ok(())
}
