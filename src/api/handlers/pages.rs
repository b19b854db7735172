//! Minimal server-rendered HTML. Every interpolated value goes through
//! `html_escape`.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::fmt::Write;
use url::form_urlencoded;

use crate::{
    bank::{Question, Topic},
    credentials::UserRecord,
    roles::{Capability, Role},
};

/// Percent-encode one path segment (spaces as `%20`, not `+`).
pub fn encode_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub fn question_link(action: &str, topic: &str, index: usize) -> String {
    format!("/{action}/{}/{index}", encode_segment(topic))
}

fn nav(user: Option<&UserRecord>) -> String {
    let mut links = String::from(r#"<a href="/">Home</a>"#);
    match user {
        None => links.push_str(r#" | <a href="/login">Log in</a> | <a href="/register">Register</a>"#),
        Some(user) => {
            links.push_str(r#" | <a href="/normal_dashboard">Study</a>"#);
            if Capability::BankAdmin.allows(user.role) {
                links.push_str(r#" | <a href="/teacher_dashboard">Questions</a>"#);
            }
            if Capability::UserAdmin.allows(user.role) {
                links.push_str(r#" | <a href="/admin_dashboard">Users</a>"#);
            }
            let _ = write!(
                links,
                r#" | <a href="/update_profile">{}</a> | <a href="/logout">Log out</a>"#,
                text(&user.name)
            );
        }
    }
    format!("<nav>{links}</nav>")
}

fn layout(title: &str, user: Option<&UserRecord>, notice: Option<&str>, body: &str) -> String {
    let notice = notice.map_or_else(String::new, |n| {
        format!(r#"<p class="notice">{}</p>"#, text(n))
    });
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} - Quizdesk</title></head>
<body>
{nav}
<h1>{title}</h1>
{notice}
{body}
</body>
</html>
"#,
        title = text(title),
        nav = nav(user),
    )
}

fn role_options(selected: Option<Role>) -> String {
    let mut options = String::new();
    for role in Role::ALL {
        let mark = if Some(role) == selected { " selected" } else { "" };
        let _ = write!(options, r#"<option value="{role}"{mark}>{role}</option>"#);
    }
    options
}

fn topic_options(topics: &[String], selected: Option<&str>) -> String {
    let mut options = String::new();
    for topic in topics {
        let mark = if Some(topic.as_str()) == selected { " selected" } else { "" };
        let _ = write!(
            options,
            r#"<option value="{}"{mark}>{}</option>"#,
            attr(topic),
            text(topic)
        );
    }
    options
}

pub fn home(user: Option<&UserRecord>, user_count: i64, notice: Option<&str>) -> String {
    let body = format!(
        "<p>Registered users: <strong>{user_count}</strong></p>\
         <p>Study topic flashcards, or manage the question bank and user directory.</p>"
    );
    layout("Welcome", user, notice, &body)
}

pub fn register(notice: Option<&str>) -> String {
    let body = format!(
        r#"<form method="post" action="/register">
<label>Name <input name="name" required></label>
<label>Email <input name="email" type="email" required></label>
<label>Password <input name="password" type="password" required></label>
<label>Role <select name="role">{}</select></label>
<button type="submit">Register</button>
</form>"#,
        role_options(Some(Role::Student))
    );
    layout("Register", None, notice, &body)
}

pub fn login(notice: Option<&str>) -> String {
    let body = format!(
        r#"<form method="post" action="/login">
<label>Email <input name="email" type="email" required></label>
<label>Password <input name="password" type="password" required></label>
<label>Role <select name="role"><option value="">Select a role</option>{}</select></label>
<button type="submit">Log in</button>
</form>"#,
        role_options(None)
    );
    layout("Log in", None, notice, &body)
}

pub fn study(
    user: &UserRecord,
    topics: &[String],
    selected: Option<&str>,
    cards: &[Question],
    notice: Option<&str>,
) -> String {
    let mut body = format!(
        r#"<form method="post" action="/normal_dashboard">
<label>Topic <select name="topic">{}</select></label>
<label>Or a custom topic <input name="custom_topic"></label>
<label>Number of flashcards <input name="num_flashcards" type="number" min="1" value="3"></label>
<button type="submit">Study</button>
</form>"#,
        topic_options(topics, selected)
    );
    if !cards.is_empty() {
        body.push_str(r#"<ol class="flashcards">"#);
        for card in cards {
            let _ = write!(
                body,
                "<li><p><strong>{}</strong></p><details><summary>Answer</summary>{}</details></li>",
                text(&card.question),
                text(&card.answer)
            );
        }
        body.push_str("</ol>");
    }
    layout("Study flashcards", Some(user), notice, &body)
}

pub fn admin_dashboard(user: &UserRecord, users: &[UserRecord], notice: Option<&str>) -> String {
    let mut body = format!(
        r#"<p>Total users: {}</p><p><a href="/add_user">Add user</a></p>
<table><tr><th>Name</th><th>Email</th><th>Role</th><th></th></tr>"#,
        users.len()
    );
    for row in users {
        let _ = write!(
            body,
            r#"<tr><td>{name}</td><td>{email}</td><td>{role}</td><td>
<a href="/user_details/{id}">View</a> <a href="/edit_user/{id}">Edit</a>
<a href="/change_role/{id}">Next role</a> <a href="/delete_user/{id}">Delete</a></td></tr>"#,
            name = text(&row.name),
            email = text(&row.email),
            role = row.role,
            id = row.id,
        );
    }
    body.push_str("</table>");
    body.push_str(&user_form_fields("/admin_dashboard", None, true));
    layout("User administration", Some(user), notice, &body)
}

pub fn user_details(viewer: &UserRecord, user: &UserRecord, notice: Option<&str>) -> String {
    let body = format!(
        r#"<dl><dt>Id</dt><dd>{id}</dd><dt>Name</dt><dd>{name}</dd>
<dt>Email</dt><dd>{email}</dd><dt>Role</dt><dd>{role}</dd></dl>
<p><a href="/edit_user/{id}">Edit</a> | <a href="/admin_dashboard">Back</a></p>"#,
        id = user.id,
        name = text(&user.name),
        email = text(&user.email),
        role = user.role,
    );
    layout("User details", Some(viewer), notice, &body)
}

fn user_form_fields(action: &str, user: Option<&UserRecord>, with_password: bool) -> String {
    let password = if with_password {
        r#"<label>Password <input name="password" type="password" required></label>"#
    } else {
        ""
    };
    format!(
        r#"<form method="post" action="{action}">
<label>Name <input name="name" value="{name}" required></label>
<label>Email <input name="email" type="email" value="{email}" required></label>
{password}
<label>Role <select name="role">{roles}</select></label>
<button type="submit">Save</button>
</form>"#,
        action = attr(action),
        name = user.map_or_else(Default::default, |u| attr(&u.name).into_owned()),
        email = user.map_or_else(Default::default, |u| attr(&u.email).into_owned()),
        roles = role_options(user.map(|u| u.role).or(Some(Role::Normal))),
    )
}

pub fn add_user(viewer: &UserRecord, notice: Option<&str>) -> String {
    layout(
        "Add user",
        Some(viewer),
        notice,
        &user_form_fields("/add_user", None, true),
    )
}

pub fn edit_user(viewer: &UserRecord, user: &UserRecord, notice: Option<&str>) -> String {
    let action = format!("/edit_user/{}", user.id);
    layout(
        "Edit user",
        Some(viewer),
        notice,
        &user_form_fields(&action, Some(user), false),
    )
}

pub fn update_profile(user: &UserRecord, notice: Option<&str>) -> String {
    let body = format!(
        r#"<form method="post" action="/update_profile">
<label>Name <input name="name" value="{}" required></label>
<label>Email <input name="email" type="email" value="{}" required></label>
<button type="submit">Save</button>
</form>
<p><a href="/change_password">Change password</a></p>"#,
        attr(&user.name),
        attr(&user.email)
    );
    layout("Your profile", Some(user), notice, &body)
}

pub fn change_password(user: &UserRecord, notice: Option<&str>) -> String {
    let body = r#"<form method="post" action="/change_password">
<label>Current password <input name="current_password" type="password" required></label>
<label>New password <input name="new_password" type="password" required></label>
<button type="submit">Change password</button>
</form>"#;
    layout("Change password", Some(user), notice, body)
}

pub fn teacher_dashboard(user: &UserRecord, topics: &[Topic], notice: Option<&str>) -> String {
    let mut body = String::from(
        r#"<p><a href="/add_question">Add question</a> | <a href="/manage_questions">Manage questions</a> | <a href="/delete_topic_page">Delete a topic</a></p><ul>"#,
    );
    for topic in topics {
        let _ = write!(
            body,
            "<li>{} ({} questions)</li>",
            text(&topic.name),
            topic.questions.len()
        );
    }
    body.push_str("</ul>");
    layout("Question bank", Some(user), notice, &body)
}

pub fn add_question(user: &UserRecord, topics: &[String], notice: Option<&str>) -> String {
    let body = format!(
        r#"<form method="post" action="/add_question">
<label>Existing topic <select name="topic"><option value="">-</option>{}</select></label>
<label>Or a new topic <input name="new_topic"></label>
<label>Question <input name="question" required></label>
<label>Answer <input name="answer" required></label>
<button type="submit">Add</button>
</form>"#,
        topic_options(topics, None)
    );
    layout("Add question", Some(user), notice, &body)
}

pub fn manage_questions(user: &UserRecord, topics: &[Topic], notice: Option<&str>) -> String {
    let mut body = String::from(r#"<p><a href="/add_question">Add question</a></p>"#);
    for topic in topics {
        let _ = write!(body, "<h2>{}</h2>", text(&topic.name));
        if topic.questions.is_empty() {
            body.push_str("<p>No questions yet.</p>");
        }
        body.push_str("<ol start=\"0\">");
        for (index, question) in topic.questions.iter().enumerate() {
            let _ = write!(
                body,
                r#"<li>{q} &rarr; {a} <a href="{edit}">Edit</a> <a href="{delete}">Delete</a></li>"#,
                q = text(&question.question),
                a = text(&question.answer),
                edit = attr(&question_link("edit_question", &topic.name, index)),
                delete = attr(&question_link("delete_question", &topic.name, index)),
            );
        }
        let _ = write!(
            body,
            r#"</ol><form method="post" action="/delete_topic"><input type="hidden" name="topic" value="{}"><button type="submit">Delete topic</button></form>"#,
            attr(&topic.name)
        );
    }
    layout("Manage questions", Some(user), notice, &body)
}

pub fn edit_question(
    user: &UserRecord,
    topic: &str,
    index: usize,
    question: &Question,
    notice: Option<&str>,
) -> String {
    let body = format!(
        r#"<p>Topic: {topic_text}, question #{index}</p>
<form method="post" action="{action}">
<label>Question <input name="question" value="{q}" required></label>
<label>Answer <input name="answer" value="{a}" required></label>
<button type="submit">Save</button>
</form>"#,
        topic_text = text(topic),
        action = attr(&question_link("edit_question", topic, index)),
        q = attr(&question.question),
        a = attr(&question.answer),
    );
    layout("Edit question", Some(user), notice, &body)
}

pub fn delete_topic(user: &UserRecord, topics: &[String], notice: Option<&str>) -> String {
    let body = format!(
        r#"<form method="post" action="/delete_topic">
<label>Topic <select name="topic">{}</select></label>
<button type="submit">Delete topic and all its questions</button>
</form>"#,
        topic_options(topics, None)
    );
    layout("Delete topic", Some(user), notice, &body)
}

pub fn internal_error() -> String {
    layout(
        "Something went wrong",
        None,
        None,
        "<p>The request could not be completed. Please try again later.</p>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: Role) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            name: "<Ann>".to_string(),
            role,
            email: "ann@example.com".to_string(),
            password_hash: String::new(),
        }
    }

    #[test]
    fn segments_encode_spaces_and_slashes() {
        assert_eq!(encode_segment("world history"), "world%20history");
        assert_eq!(encode_segment("a/b+c"), "a%2Fb%2Bc");
        assert_eq!(
            question_link("edit_question", "C++ basics", 2),
            "/edit_question/C%2B%2B%20basics/2"
        );
    }

    #[test]
    fn user_text_is_escaped() {
        let page = update_profile(&user(Role::Student), None);
        assert!(page.contains("&lt;Ann&gt;"));
        assert!(!page.contains("<Ann>"));
    }

    #[test]
    fn nav_follows_capabilities() {
        let student = home(Some(&user(Role::Student)), 1, None);
        assert!(!student.contains("/admin_dashboard"));
        assert!(!student.contains("/teacher_dashboard"));

        let teacher = home(Some(&user(Role::Teacher)), 1, None);
        assert!(teacher.contains("/teacher_dashboard"));
        assert!(!teacher.contains("/admin_dashboard"));
    }

    #[test]
    fn notice_is_rendered() {
        let page = login(Some("Role mismatch: your account role is normal"));
        assert!(page.contains(r#"<p class="notice">Role mismatch: your account role is normal</p>"#));
    }
}
