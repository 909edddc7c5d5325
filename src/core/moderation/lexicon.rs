// The banned-phrase lexicon.
//
// Pure data: a fixed table compiled into the binary. Nothing mutates it at
// runtime, so it can be shared across tasks without synchronization.

/// Which policy area a banned phrase belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexiconCategory {
    Harassment,
    Explicit,
    ProhibitedTopics,
    Violence,
    Gambling,
    ControlledSubstances,
    Discriminatory,
    Fraud,
}

impl std::fmt::Display for LexiconCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexiconCategory::Harassment => write!(f, "Harassment"),
            LexiconCategory::Explicit => write!(f, "Explicit"),
            LexiconCategory::ProhibitedTopics => write!(f, "Prohibited Topics"),
            LexiconCategory::Violence => write!(f, "Violence"),
            LexiconCategory::Gambling => write!(f, "Gambling"),
            LexiconCategory::ControlledSubstances => write!(f, "Controlled Substances"),
            LexiconCategory::Discriminatory => write!(f, "Discriminatory"),
            LexiconCategory::Fraud => write!(f, "Fraud"),
        }
    }
}

/// A single banned phrase and the category it was filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexiconEntry {
    pub phrase: &'static str,
    pub category: LexiconCategory,
}

impl LexiconEntry {
    pub const fn new(phrase: &'static str, category: LexiconCategory) -> Self {
        Self { phrase, category }
    }
}

/// Expands a list of phrases into entries of one category.
macro_rules! entries {
    ($category:ident: $($phrase:literal),* $(,)?) => {
        [$(LexiconEntry::new($phrase, LexiconCategory::$category)),*]
    };
}

const HARASSMENT: &[LexiconEntry] = &entries!(Harassment:
    "傻逼", "蠢货", "废物", "垃圾", "去死", "操你", "艹你", "妈的", "他妈", "妈逼", "草泥马",
    "傻B", "SB", "煞笔", "傻比", "脑残", "白痴", "二逼", "贱人", "贱货", "婊子", "妓女",
    "狗屎", "狗屁", "放屁", "屁话", "废物点心", "死全家", "死妈", "死爹", "不得好死",
);

const EXPLICIT: &[LexiconEntry] = &entries!(Explicit:
    "做爱", "性交", "裸体", "色情", "黄片", "av", "a片", "约炮", "一夜情", "嫖娼", "卖淫",
    "阴茎", "阴道", "阴蒂", "乳房", "乳头", "口交", "肛交", "手淫", "自慰", "性高潮", "性欲",
    "情色", "成人", "三级片", "毛片", "黄网", "色情网站", "裸聊", "视频裸聊", "色情服务",
);

const PROHIBITED_TOPICS: &[LexiconEntry] = &entries!(ProhibitedTopics:
    "政府", "共产党", "国家领导人", "政治", "反动", "颠覆", "游行", "示威", "暴乱", "独立",
    "西藏独立", "台湾独立", "新疆独立", "香港独立", "法轮功", "邪教", "恐怖主义", "极端主义",
    "领导人", "主席", "总理", "国家主席", "国务院", "中央政府", "地方政府", "政权", "体制",
);

const VIOLENCE: &[LexiconEntry] = &entries!(Violence:
    "杀人", "杀戮", "屠杀", "血腥", "暴力", "打架", "斗殴", "砍人", "捅刀", "枪击", "爆炸",
    "自杀", "自残", "自虐", "虐待", "施暴", "施虐", "家暴", "家庭暴力", "校园暴力", "暴力倾向",
);

const GAMBLING: &[LexiconEntry] = &entries!(Gambling:
    "赌博", "赌场", "赌钱", "赌球", "赌马", "六合彩", "彩票", "老虎机", "轮盘", "百家乐",
    "赌局", "赌徒", "赌债", "赌王", "赌神", "赌圣", "赌鬼", "赌棍", "赌博网站", "在线赌博",
);

const CONTROLLED_SUBSTANCES: &[LexiconEntry] = &entries!(ControlledSubstances:
    "毒品", "吸毒", "贩毒", "海洛因", "冰毒", "摇头丸", "大麻", "鸦片", "可卡因", "吗啡",
    "吸毒者", "毒贩", "毒枭", "毒瘾", "戒毒", "复吸", "注射", "针筒", "毒品交易", "制毒",
);

const DISCRIMINATORY: &[LexiconEntry] = &entries!(Discriminatory:
    "种族歧视", "性别歧视", "地域歧视", "残疾人", "残废", "瞎子", "聋子", "哑巴", "瘸子",
    "黑人", "白人", "黄种人", "穆斯林", "伊斯兰", "基督教", "佛教", "天主教", "犹太教",
);

const FRAUD: &[LexiconEntry] = &entries!(Fraud:
    "诈骗", "传销", "非法集资", "洗钱", "走私", "偷税", "漏税", "逃税", "贪污", "受贿",
    "行贿", "腐败", "权钱交易", "权色交易", "权势", "特权", "黑社会", "黑帮", "黑道",
    "黑客", "病毒", "木马", "钓鱼", "诈骗电话", "诈骗短信", "诈骗邮件", "网络诈骗", "电信诈骗",
);

const GROUPS: [&[LexiconEntry]; 8] = [
    HARASSMENT,
    EXPLICIT,
    PROHIBITED_TOPICS,
    VIOLENCE,
    GAMBLING,
    CONTROLLED_SUBSTANCES,
    DISCRIMINATORY,
    FRAUD,
];

/// The full lexicon in matching order, category by category.
pub fn standard_lexicon() -> Vec<LexiconEntry> {
    GROUPS.iter().flat_map(|group| group.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lexicon_has_no_duplicate_phrases() {
        let lexicon = standard_lexicon();
        let unique: HashSet<&str> = lexicon.iter().map(|e| e.phrase).collect();
        assert_eq!(unique.len(), lexicon.len());
    }

    #[test]
    fn test_every_category_is_populated() {
        let lexicon = standard_lexicon();
        let categories: HashSet<LexiconCategory> = lexicon.iter().map(|e| e.category).collect();
        assert_eq!(categories.len(), 8);
    }

    #[test]
    fn test_lexicon_keeps_category_order() {
        let lexicon = standard_lexicon();
        assert_eq!(lexicon.first().map(|e| e.category), Some(LexiconCategory::Harassment));
        assert_eq!(lexicon.last().map(|e| e.category), Some(LexiconCategory::Fraud));
    }
}
