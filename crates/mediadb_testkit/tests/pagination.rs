//! First/skip pagination through the catalog facade.

use mediadb_catalog::relations::{UserMedia, UserMediaQueries, WatchStatus};
use mediadb_testkit::{catalog, media, user};

#[test]
fn windows_over_an_id_ordered_scan() {
    let catalog = catalog();

    catalog
        .update(|tx| {
            for i in 1..=5 {
                catalog.media().create(tx, &mut media(&format!("m{i}")))?;
            }
            Ok(())
        })
        .unwrap();

    let titles = |first: Option<i64>, skip: Option<i64>| {
        catalog
            .view(|tx| Ok(catalog.media().get_all(tx, first, skip)?))
            .unwrap()
            .into_iter()
            .map(|m| m.titles[0].text.clone())
            .collect::<Vec<_>>()
    };

    assert_eq!(titles(Some(2), Some(1)), vec!["m2", "m3"]);
    assert_eq!(titles(Some(-1), Some(2)), vec!["m3", "m4", "m5"]);
    assert_eq!(titles(None, None).len(), 5);
    assert!(titles(Some(0), Some(0)).is_empty());
    assert_eq!(titles(Some(2), Some(-5)), vec!["m1", "m2"]);
}

#[test]
fn foreign_key_queries_window_after_filtering() {
    let catalog = catalog();

    let user_id = catalog
        .update(|tx| {
            let user_id = catalog.users().create(tx, &mut user("pager"))?;
            let noise_user = catalog.users().create(tx, &mut user("noise"))?;

            for i in 1..=6 {
                let media_id = catalog.media().create(tx, &mut media(&format!("m{i}")))?;
                // Interleave records of another user so the scan has to
                // filter before windowing.
                catalog.user_media().create(
                    tx,
                    &mut UserMedia {
                        user_id: noise_user,
                        media_id,
                        status: WatchStatus::Planning,
                        ..Default::default()
                    },
                )?;
                catalog.user_media().create(
                    tx,
                    &mut UserMedia {
                        user_id,
                        media_id,
                        status: WatchStatus::Watching,
                        ..Default::default()
                    },
                )?;
            }
            Ok(user_id)
        })
        .unwrap();

    let page = catalog
        .view(|tx| Ok(catalog.user_media().get_by_user(tx, user_id, Some(3), Some(2))?))
        .unwrap();

    assert_eq!(page.len(), 3);
    assert!(page.iter().all(|r| r.user_id == user_id));
    // Entries come back in creation (ID) order; skipping 2 of the
    // user's 6 entries lands on the 3rd, 4th and 5th.
    let media_ids: Vec<u64> = page.iter().map(|r| r.media_id.as_u64()).collect();
    assert_eq!(media_ids, vec![3, 4, 5]);
}

#[test]
fn get_multiple_follows_caller_order() {
    let catalog = catalog();

    let ids = catalog
        .update(|tx| {
            (1..=4)
                .map(|i| catalog.media().create(tx, &mut media(&format!("m{i}"))))
                .collect::<Result<Vec<_>, _>>()
                .map_err(Into::into)
        })
        .unwrap();

    let picked = catalog
        .view(|tx| {
            Ok(catalog
                .media()
                .get_multiple(tx, &[ids[3], ids[0], ids[2]], Some(2), None, |_| true)?)
        })
        .unwrap();

    let titles: Vec<&str> = picked.iter().map(|m| m.titles[0].text.as_str()).collect();
    assert_eq!(titles, vec!["m4", "m1"]);
}
