//! Sample data the mock store starts with

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::models::{
    avatar_url, Author, Comment, KnowledgeBase, Message, Paper, Post, User, CURRENT_USER_ID,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .unwrap_or_default()
}

fn paper(id: i64, title: &str, authors: &[&str], abstract_text: &str, published: &str, slug: &str) -> Paper {
    Paper {
        id,
        title: title.to_string(),
        authors: authors.iter().map(|a| a.to_string()).collect(),
        abstract_text: abstract_text.to_string(),
        publish_date: published.to_string(),
        doi: Some(format!("10.1234/{}", slug)),
        url: Some(format!("https://example.com/paper{}", id)),
    }
}

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

pub fn current_user() -> User {
    User {
        id: CURRENT_USER_ID,
        username: "当前用户".to_string(),
        avatar: avatar_url("current"),
        followers: 0,
        following: 0,
        location: None,
        experience: None,
        following_list: Vec::new(),
    }
}

pub fn users() -> Vec<User> {
    let mut users = vec![
        User::new(1, "用户1", 120, 45),
        User::new(2, "用户2", 85, 32),
        User::new(3, "用户3", 210, 67),
        User::new(4, "用户4", 95, 28),
        User::new(5, "用户5", 150, 53),
    ];
    for (id, name, followers, following) in [
        (101, "paper_reader", 49_000, 120),
        (102, "travel_world", 30_500, 210),
        (103, "drone_master", 78_900, 150),
    ] {
        let mut creator = User::new(id, name, followers, following);
        creator.avatar = avatar_url(name);
        users.push(creator);
    }
    users
}

pub fn knowledge_bases() -> Vec<KnowledgeBase> {
    vec![
        KnowledgeBase {
            id: 1,
            title: "AI Ethics Research".into(),
            description: "Papers on the ethical questions raised by AI systems".into(),
            user_id: 1,
            papers: vec![
                paper(1, "A Framework for AI Ethics", &["Zhang San", "Li Si"],
                    "Proposes a framework for assessing the ethical impact of AI systems.",
                    "2022-12-10", "ai-ethics-2022"),
                paper(2, "Transparency in AI Decision Making", &["Wang Wu", "Zhao Liu"],
                    "Surveys methods that make automated decisions explainable.",
                    "2023-01-05", "ai-transparency-2023"),
            ],
            tags: tags(&["AI", "ethics", "transparency"]),
            stars: 42,
            forks: 12,
            created_at: date(2023, 1, 15),
            updated_at: date(2023, 4, 20),
        },
        KnowledgeBase {
            id: 2,
            title: "Optimizing ML Algorithms".into(),
            description: "Tricks and practices for faster, better machine learning".into(),
            user_id: 2,
            papers: vec![paper(3, "Accelerating Deep Network Training", &["Chen Qi", "Zhou Ba"],
                "Reviews techniques that shorten deep neural network training.",
                "2023-02-15", "dl-acceleration-2023")],
            tags: tags(&["machine learning", "deep learning", "optimization"]),
            stars: 38,
            forks: 8,
            created_at: date(2023, 2, 10),
            updated_at: date(2023, 4, 18),
        },
        KnowledgeBase {
            id: 3,
            title: "Large Language Models".into(),
            description: "Architecture, training and applications of LLMs".into(),
            user_id: CURRENT_USER_ID,
            papers: vec![
                paper(4, "The Transformer Architecture in Depth", &["Li Ming", "Wang Hua"],
                    "Walks through every component of the Transformer and its impact on NLP.",
                    "2023-06-20", "transformer-analysis-2023"),
                paper(5, "A Survey of LLM Training", &["Zhang Wei", "Liu Fang"],
                    "Covers data processing, pre-training and instruction tuning.",
                    "2023-07-15", "llm-training-survey-2023"),
                paper(6, "LLMs in Medicine", &["Chen Jian", "Lin Xue"],
                    "Diagnosis, literature analysis and clinical decision support with LLMs.",
                    "2023-08-22", "llm-medical-applications-2023"),
            ],
            tags: tags(&["LLM", "NLP", "AI", "Transformer"]),
            stars: 156,
            forks: 47,
            created_at: date(2023, 5, 12),
            updated_at: date(2023, 11, 8),
        },
        KnowledgeBase {
            id: 4,
            title: "Computer Vision Highlights".into(),
            description: "Detection, segmentation and video understanding".into(),
            user_id: CURRENT_USER_ID,
            papers: vec![
                paper(7, "Multimodal Object Detection", &["Zheng Qiang", "Zhao Ming"],
                    "Fusing infrared and visible-light sensors for detection.",
                    "2023-04-10", "multimodal-detection-2023"),
                paper(8, "Self-Supervised Image Segmentation", &["Huang Lei", "Wu Jia"],
                    "A pre-training framework that improves segmentation quality.",
                    "2023-06-05", "self-supervised-segmentation-2023"),
            ],
            tags: tags(&["computer vision", "detection", "segmentation", "deep learning"]),
            stars: 87,
            forks: 23,
            created_at: date(2023, 3, 5),
            updated_at: date(2023, 10, 30),
        },
        KnowledgeBase {
            id: 5,
            title: "Reinforcement Learning".into(),
            description: "Theory, research directions and applications of RL".into(),
            user_id: CURRENT_USER_ID,
            papers: vec![
                paper(9, "Advances in Multi-Agent RL", &["Sun Wei", "Li Qiang"],
                    "Cooperative and competitive multi-agent algorithms.",
                    "2023-05-20", "marl-advances-2023"),
                paper(10, "Comparing Model-Based RL Methods", &["Wang Lei", "Zhang Hong"],
                    "Efficiency, stability and generalisation of model-based RL.",
                    "2023-07-12", "model-based-rl-comparison-2023"),
                paper(11, "RL for Autonomous Driving", &["Liu Ming", "Chen Liang"],
                    "Decision making, planning and scene understanding with RL.",
                    "2023-09-08", "rl-autonomous-driving-2023"),
            ],
            tags: tags(&["reinforcement learning", "AI", "multi-agent", "autonomous driving"]),
            stars: 112,
            forks: 34,
            created_at: date(2023, 4, 18),
            updated_at: date(2023, 12, 1),
        },
    ]
}

pub fn messages() -> Vec<Message> {
    vec![
        Message {
            id: 1,
            sender_id: 1,
            receiver_id: CURRENT_USER_ID,
            content: "你好，我对你的知识库很感兴趣！".into(),
            timestamp: at(2023, 4, 28, 10, 30),
            is_read: true,
        },
        Message {
            id: 2,
            sender_id: CURRENT_USER_ID,
            receiver_id: 1,
            content: "谢谢关注！有什么可以帮你的吗？".into(),
            timestamp: at(2023, 4, 28, 11, 15),
            is_read: true,
        },
        Message {
            id: 3,
            sender_id: 2,
            receiver_id: CURRENT_USER_ID,
            content: "可以交流一下人工智能方面的研究吗？".into(),
            timestamp: at(2023, 4, 27, 9, 20),
            is_read: false,
        },
    ]
}

fn author(id: i64, username: &str) -> Author {
    Author {
        id,
        username: username.to_string(),
        avatar: None,
    }
}

pub fn posts() -> Vec<Post> {
    vec![
        Post {
            id: 1,
            title: "Reading group: attention is all you need".into(),
            author: author(1, "用户1"),
            likes: 32,
            views: 410,
            comments_count: 2,
            is_approved: true,
            is_hidden: false,
            created_at: at(2023, 5, 2, 8, 0),
        },
        Post {
            id: 2,
            title: "Looking for RL paper recommendations".into(),
            author: author(2, "用户2"),
            likes: 4,
            views: 57,
            comments_count: 1,
            is_approved: false,
            is_hidden: false,
            created_at: at(2023, 5, 3, 14, 30),
        },
        Post {
            id: 3,
            title: "Spam: cheap drone parts".into(),
            author: author(103, "drone_master"),
            likes: 0,
            views: 12,
            comments_count: 0,
            is_approved: false,
            is_hidden: true,
            created_at: at(2023, 5, 4, 9, 45),
        },
        Post {
            id: 4,
            title: "My notes on segmentation benchmarks".into(),
            author: author(3, "用户3"),
            likes: 18,
            views: 230,
            comments_count: 2,
            is_approved: false,
            is_hidden: false,
            created_at: at(2023, 5, 5, 20, 10),
        },
    ]
}

pub fn comments() -> Vec<Comment> {
    let comment = |id: i64, post_id: i64, who: Author, content: &str, approved: bool, at_: DateTime<Utc>| Comment {
        id,
        content: content.to_string(),
        author: who,
        post_id,
        is_approved: approved,
        is_hidden: false,
        likes: 0,
        created_at: at_,
    };
    vec![
        comment(1, 1, author(2, "用户2"), "Count me in!", true, at(2023, 5, 2, 9, 0)),
        comment(2, 1, author(4, "用户4"), "Which chapter first?", false, at(2023, 5, 2, 9, 30)),
        comment(3, 2, author(5, "用户5"), "Start with the Sutton & Barto book.", false, at(2023, 5, 3, 15, 0)),
        comment(4, 4, author(1, "用户1"), "Great write-up.", true, at(2023, 5, 6, 7, 0)),
        comment(5, 4, author(102, "travel_world"), "Check my profile for deals", false, at(2023, 5, 6, 8, 0)),
    ]
}
