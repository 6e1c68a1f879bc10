use crate::common::{TestApp, movie_form, routes, text_fields};

mod page_views {
    use super::*;

    #[tokio::test]
    async fn index_renders_movie_list() {
        let app = TestApp::spawn().await;
        app.create_movie("Listed").await;

        let res = app.get(routes::PAGES).await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains(r#"data-view="movies.index""#));
        let context = res.view_context();
        assert_eq!(context["movies"][0]["title"], "Listed");
    }

    #[tokio::test]
    async fn create_form_lists_genres() {
        let app = TestApp::spawn().await;
        let genres = app.genre_ids().await;

        let res = app.get(routes::PAGE_CREATE).await;

        assert_eq!(res.status, 200);
        let context = res.view_context();
        assert_eq!(context["genres"].as_array().unwrap().len(), genres.len());
        assert_eq!(context["errors"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn show_renders_movie_and_its_genres() {
        let app = TestApp::spawn().await;
        let genres = app.genre_ids().await;
        let form = movie_form("Shown").text("genre_id[]", genres[3].to_string());
        let id = app.post_multipart(routes::MOVIES, form).await.id();

        let res = app.get(&routes::page(id)).await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains(r#"data-view="movies.show""#));
        let context = res.view_context();
        assert_eq!(context["movie"]["title"], "Shown");
        assert_eq!(context["genres"][0]["id"], genres[3]);
    }

    #[tokio::test]
    async fn edit_renders_form() {
        let app = TestApp::spawn().await;
        let id = app.create_movie("Editable").await["id"].as_i64().unwrap() as i32;

        let res = app.get(&routes::page_edit(id)).await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains(r#"data-view="movies.edit""#));
        assert_eq!(res.view_context()["movie"]["id"], id);
    }

    #[tokio::test]
    async fn missing_movie_page_is_not_found() {
        let app = TestApp::spawn().await;

        assert_eq!(app.get(&routes::page(5)).await.status, 404);
        assert_eq!(app.get(&routes::page_edit(5)).await.status, 404);
    }

    #[tokio::test]
    async fn markup_in_fields_cannot_break_out() {
        let app = TestApp::spawn().await;
        app.create_movie("</script><script>alert(1)</script>").await;

        let res = app.get(routes::PAGES).await;

        assert_eq!(res.text.matches("</script>").count(), 1);
        assert_eq!(
            res.view_context()["movies"][0]["title"],
            "</script><script>alert(1)</script>"
        );
    }
}

mod page_writes {
    use super::*;

    #[tokio::test]
    async fn store_redirects_to_listing() {
        let app = TestApp::spawn().await;

        let res = app.post_multipart(routes::PAGES, movie_form("Via page")).await;

        assert_eq!(res.status, 303);
        assert_eq!(res.location.as_deref(), Some("/peliculas"));
        let list = app.get(routes::MOVIES).await;
        assert_eq!(list.body[0]["title"], "Via page");
    }

    #[tokio::test]
    async fn invalid_store_rerenders_form() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(routes::PAGES, text_fields("No files"))
            .await;

        assert_eq!(res.status, 422);
        assert!(res.text.contains(r#"data-view="movies.create""#));
        let context = res.view_context();
        assert_eq!(context["errors"]["poster"][0], "The poster field is required.");
        assert_eq!(context["old"]["title"], "No files");
        assert!(context["genres"].as_array().is_some());
    }

    #[tokio::test]
    async fn update_redirects_and_invalid_update_rerenders() {
        let app = TestApp::spawn().await;
        app.create_movie("Taken").await;
        let id = app.create_movie("Mine").await["id"].as_i64().unwrap() as i32;

        let ok = app
            .post_multipart(&routes::page(id), text_fields("Mine, renamed"))
            .await;
        assert_eq!(ok.status, 303);
        assert_eq!(ok.location.as_deref(), Some("/peliculas"));

        let conflict = app.put_multipart(&routes::page(id), text_fields("Taken")).await;
        assert_eq!(conflict.status, 422);
        let context = conflict.view_context();
        assert_eq!(context["movie"]["title"], "Mine, renamed");
        assert_eq!(
            context["errors"]["title"][0],
            "The title has already been taken."
        );
        assert_eq!(context["old"]["title"], "Taken");
    }

    #[tokio::test]
    async fn delete_via_post_and_delete_method() {
        let app = TestApp::spawn().await;
        let a = app.create_movie("Delete A").await["id"].as_i64().unwrap() as i32;
        let b = app.create_movie("Delete B").await["id"].as_i64().unwrap() as i32;

        let res = app.post_form(&routes::page_delete(a), &[]).await;
        assert_eq!(res.status, 303);
        let res = app.delete(&routes::page(b)).await;
        assert_eq!(res.status, 303);

        let list = app.get(routes::MOVIES).await;
        assert_eq!(list.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn genre_forms_link_and_unlink() {
        let app = TestApp::spawn().await;
        let genres = app.genre_ids().await;
        let id = app.create_movie("Form genres").await["id"].as_i64().unwrap() as i32;

        let res = app
            .post_form(
                &routes::page_add_genre(id),
                &[
                    ("genre_id[]", genres[0].to_string()),
                    ("genre_id[]", genres[1].to_string()),
                ],
            )
            .await;
        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(app.link_count(id).await, 2);

        let res = app
            .post_form(
                &routes::page_delete_genre(id),
                &[("genre_id[]", genres[0].to_string())],
            )
            .await;
        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(app.link_count(id).await, 1);
    }

    #[tokio::test]
    async fn empty_genre_form_rerenders_show() {
        let app = TestApp::spawn().await;
        let id = app.create_movie("No selection").await["id"].as_i64().unwrap() as i32;

        let res = app.post_form(&routes::page_add_genre(id), &[]).await;

        assert_eq!(res.status, 422);
        assert!(res.text.contains(r#"data-view="movies.show""#));
        assert!(res.view_context()["errors"]["genre_id"].is_array());
    }
}
